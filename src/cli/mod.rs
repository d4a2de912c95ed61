use clap::Parser;
use std::path::PathBuf;

use crate::api::{ BackendConfig, DEFAULT_BASE_URL, DEFAULT_CHAT_PATH };

const APP_DIR: &str = "rag-chat-client";
const SESSION_FILE_NAME: &str = "session.json";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Backend Args ---
    /// Base URL of the chat backend (scheme, host and port; no trailing path)
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub api_base_url: String,

    /// Path of the chat endpoint. Use /chat for the legacy unauthenticated form.
    #[arg(long, env = "CHAT_PATH", default_value = DEFAULT_CHAT_PATH)]
    pub chat_path: String,

    // --- Session Args ---
    /// File holding the persisted bearer token. Defaults to <config dir>/rag-chat-client/session.json
    #[arg(long, env = "SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Keep the session in memory only; nothing survives a restart.
    #[arg(long, env = "EPHEMERAL_SESSION", default_value = "false")]
    pub ephemeral_session: bool,

    // --- General App Args ---
    /// Page to open on startup (/chat, /login, /register)
    #[arg(long, env = "START_ROUTE", default_value = "/")]
    pub start_route: String,

    /// Enable debug logging
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

impl Args {
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.api_base_url.clone(),
            chat_path: self.chat_path.clone(),
        }
    }

    pub fn session_path(&self) -> PathBuf {
        if let Some(path) = &self.session_file {
            return path.clone();
        }
        match dirs::config_dir() {
            Some(dir) => dir.join(APP_DIR).join(SESSION_FILE_NAME),
            None => PathBuf::from(format!(".{}-{}", APP_DIR, SESSION_FILE_NAME)),
        }
    }

    pub fn log_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "warn" }
    }
}
