pub mod api;
pub mod app;
pub mod cli;
pub mod conversation;
pub mod guard;
pub mod models;
pub mod router;
pub mod session;

use api::{ new_backend, Backend };
use app::App;
use cli::Args;
use log::{ info, warn };
use session::storage::{ CredentialStorage, FileStorage, MemoryStorage };
use session::SessionStore;
use std::error::Error;
use std::sync::Arc;
use tokio::io::BufReader;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let session_path = args.session_path();

    info!("--- Client Configuration ---");
    info!("API Base URL: {}", args.api_base_url);
    info!("Chat Path: {}", args.chat_path);
    if args.ephemeral_session {
        info!("Session Storage: memory");
    } else {
        info!("Session Storage: {}", session_path.display());
    }
    info!("Start Route: {}", args.start_route);
    info!("----------------------------");

    let backend = new_backend(&args.backend_config())?;
    if let Err(e) = backend.health().await {
        warn!("Backend health check failed at {}: {}", args.api_base_url, e);
    }

    let storage: Arc<dyn CredentialStorage> = if args.ephemeral_session {
        Arc::new(MemoryStorage::new())
    } else {
        Arc::new(FileStorage::new(session_path))
    };
    let session = Arc::new(SessionStore::new(storage));

    let mut app = App::new(
        backend,
        session,
        BufReader::new(tokio::io::stdin()),
        std::io::stdout()
    );
    app.run(&args.start_route).await?;

    Ok(())
}
