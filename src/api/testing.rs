use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ ApiError, Backend };
use crate::models::{ ChatRequest, ChatResponse, RegisterRequest, TokenResponse, UserProfile };

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub op: &'static str,
    pub credential: Option<String>,
    pub body: Option<JsonValue>,
}

/// In-process [`Backend`] that replays queued results and records every call it receives.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    register: Mutex<VecDeque<Result<(), ApiError>>>,
    login: Mutex<VecDeque<Result<TokenResponse, ApiError>>>,
    current_user: Mutex<VecDeque<Result<UserProfile, ApiError>>>,
    chat: Mutex<VecDeque<Result<ChatResponse, ApiError>>>,
    calls: Mutex<Vec<Call>>,
}

pub(crate) fn status_error(code: u16, detail: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::from_u16(code).unwrap(),
        detail: detail.to_string(),
    }
}

pub(crate) fn token(value: &str) -> TokenResponse {
    TokenResponse { access_token: value.to_string(), token_type: Some("bearer".into()) }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_register(self, result: Result<(), ApiError>) -> Self {
        self.register.lock().unwrap().push_back(result);
        self
    }

    pub fn on_login(self, result: Result<TokenResponse, ApiError>) -> Self {
        self.login.lock().unwrap().push_back(result);
        self
    }

    pub fn on_current_user(self, result: Result<UserProfile, ApiError>) -> Self {
        self.current_user.lock().unwrap().push_back(result);
        self
    }

    pub fn on_chat(self, result: Result<ChatResponse, ApiError>) -> Self {
        self.chat.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, op: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.op == op)
            .collect()
    }

    fn record(&self, op: &'static str, credential: Option<&str>, body: Option<JsonValue>) {
        self.calls.lock().unwrap().push(Call {
            op,
            credential: credential.map(str::to_string),
            body,
        });
    }
}

fn next<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>, op: &str) -> Result<T, ApiError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(ApiError::Decode(format!("no scripted result for {}", op))))
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn register(
        &self,
        credential: Option<&str>,
        request: &RegisterRequest
    ) -> Result<(), ApiError> {
        self.record("register", credential, serde_json::to_value(request).ok());
        next(&self.register, "register")
    }

    async fn login(
        &self,
        credential: Option<&str>,
        username: &str,
        _password: &str
    ) -> Result<TokenResponse, ApiError> {
        self.record("login", credential, Some(JsonValue::String(username.to_string())));
        next(&self.login, "login")
    }

    async fn fetch_current_user(&self, credential: Option<&str>) -> Result<UserProfile, ApiError> {
        self.record("current_user", credential, None);
        next(&self.current_user, "current_user")
    }

    async fn send_chat_message(
        &self,
        credential: Option<&str>,
        request: &ChatRequest
    ) -> Result<ChatResponse, ApiError> {
        self.record("chat", credential, serde_json::to_value(request).ok());
        next(&self.chat, "chat")
    }

    async fn health(&self) -> Result<(), ApiError> {
        Ok(())
    }
}
