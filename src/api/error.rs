use reqwest::StatusCode;
use serde_json::Value as JsonValue;
use thiserror::Error;

const TRANSPORT_MESSAGE: &str = "Could not reach the server. Please check your connection.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")] Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {detail}")] Status {
        status: StatusCode,
        detail: String,
    },

    #[error("malformed response: {0}")] Decode(String),

    #[error("invalid backend URL: {0}")] InvalidUrl(#[from] url::ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Authentication,
    Backend,
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED => {
                FailureKind::Authentication
            }
            ApiError::Status { .. } => FailureKind::Backend,
            _ => FailureKind::Transport,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind() == FailureKind::Authentication
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text shown to the user: the backend's detail verbatim, or a generic transport message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { detail, .. } => detail.clone(),
            _ => TRANSPORT_MESSAGE.to_string(),
        }
    }

    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = serde_json
            ::from_str::<JsonValue>(body)
            .ok()
            .and_then(|v| extract_detail(&v))
            .unwrap_or_else(|| fallback_status_text(status));
        ApiError::Status { status, detail }
    }
}

fn extract_detail(body: &JsonValue) -> Option<String> {
    match body.get("detail")? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}

fn fallback_status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
