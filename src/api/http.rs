use async_trait::async_trait;
use log::{ debug, warn };
use reqwest::{ Client as HttpClient, Method, RequestBuilder, Response, header::ACCEPT };
use serde::de::DeserializeOwned;
use url::Url;

use super::{ ApiError, Backend, BackendConfig };
use crate::models::{ ChatRequest, ChatResponse, RegisterRequest, TokenResponse, UserProfile };

const REGISTER_ROUTE: &str = "/api/v1/auth/register";
const TOKEN_ROUTE: &str = "/api/v1/auth/token";
const CURRENT_USER_ROUTE: &str = "/api/v1/auth/users/me";
const HEALTH_ROUTE: &str = "/health";

/// reqwest implementation of [`Backend`]. Holds no session state; credentials come in per call.
pub struct HttpBackend {
    http: HttpClient,
    /// Always ends in `/` so routes join under any path prefix.
    base_url: Url,
    chat_path: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, chat_path: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = HttpClient::builder().build()?;
        let chat_path = if chat_path.starts_with('/') {
            chat_path.to_string()
        } else {
            format!("/{}", chat_path)
        };

        Ok(Self {
            http,
            base_url: base,
            chat_path,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, &config.chat_path)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, route: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(route.trim_start_matches('/'))?)
    }

    fn request(
        &self,
        method: Method,
        route: &str,
        credential: Option<&str>
    ) -> Result<RequestBuilder, ApiError> {
        let req = self.http.request(method, self.url(route)?).header(ACCEPT, "application/json");
        Ok(match credential {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    async fn send(&self, req: RequestBuilder, route: &str) -> Result<Response, ApiError> {
        let resp = req.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", route, e);
            ApiError::Transport(e)
        })?;

        let status = resp.status();
        if status.is_success() {
            debug!("{} -> {}", route, status);
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let err = ApiError::from_status(status, &body);
        warn!("{} -> {}", route, err);
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        route: &str
    ) -> Result<T, ApiError> {
        let resp = self.send(req, route).await?;
        let body = resp.text().await?;
        serde_json
            ::from_str::<T>(&body)
            .map_err(|e| ApiError::Decode(format!("{} returned unexpected body: {}", route, e)))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn register(
        &self,
        credential: Option<&str>,
        request: &RegisterRequest
    ) -> Result<(), ApiError> {
        let req = self.request(Method::POST, REGISTER_ROUTE, credential)?.json(request);
        self.send(req, REGISTER_ROUTE).await?;
        Ok(())
    }

    async fn login(
        &self,
        credential: Option<&str>,
        username: &str,
        password: &str
    ) -> Result<TokenResponse, ApiError> {
        let form = [
            ("username", username),
            ("password", password),
        ];
        let req = self.request(Method::POST, TOKEN_ROUTE, credential)?.form(&form);
        self.send_json(req, TOKEN_ROUTE).await
    }

    async fn fetch_current_user(&self, credential: Option<&str>) -> Result<UserProfile, ApiError> {
        let req = self.request(Method::GET, CURRENT_USER_ROUTE, credential)?;
        self.send_json(req, CURRENT_USER_ROUTE).await
    }

    async fn send_chat_message(
        &self,
        credential: Option<&str>,
        request: &ChatRequest
    ) -> Result<ChatResponse, ApiError> {
        let req = self.request(Method::POST, &self.chat_path, credential)?.json(request);
        self.send_json(req, &self.chat_path).await
    }

    async fn health(&self) -> Result<(), ApiError> {
        let req = self.request(Method::GET, HEALTH_ROUTE, None)?;
        self.send(req, HEALTH_ROUTE).await?;
        Ok(())
    }
}
