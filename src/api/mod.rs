pub mod error;
pub mod http;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{ ChatRequest, ChatResponse, RegisterRequest, TokenResponse, UserProfile };
pub use self::error::{ ApiError, FailureKind };
pub use self::http::HttpBackend;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_CHAT_PATH: &str = "/api/v1/chat";

/// The backend operations the client uses. Each call is a single exchange with no retry.
///
/// `credential` is attached as `Authorization: Bearer <token>` when present, on every call.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn register(
        &self,
        credential: Option<&str>,
        request: &RegisterRequest
    ) -> Result<(), ApiError>;

    async fn login(
        &self,
        credential: Option<&str>,
        username: &str,
        password: &str
    ) -> Result<TokenResponse, ApiError>;

    async fn fetch_current_user(&self, credential: Option<&str>) -> Result<UserProfile, ApiError>;

    async fn send_chat_message(
        &self,
        credential: Option<&str>,
        request: &ChatRequest
    ) -> Result<ChatResponse, ApiError>;

    async fn health(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub chat_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
        }
    }
}

pub fn new_backend(config: &BackendConfig) -> Result<Arc<dyn Backend>, ApiError> {
    let backend = HttpBackend::from_config(config)?;
    Ok(Arc::new(backend))
}
