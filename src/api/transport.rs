//! HTTP transport: request description and the backend that sends it
//!
//! The backend knows nothing about token expiry. It attaches whatever token it
//! is handed and returns the raw envelope; renewal lives in `refresh`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use super::envelope::Envelope;
use super::error::ApiError;
use crate::config::Config;

pub const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Everything needed to (re)send a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path under the base URL, starting with `/`
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Set once the request has been replayed after a token refresh
    pub(crate) retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append a query parameter; `None` values are skipped.
    pub fn param(mut self, key: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.params.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Never start a token refresh for this request (e.g. the login call
    /// itself, where a 401 means bad credentials).
    pub fn skip_refresh(mut self) -> Self {
        self.retried = true;
        self
    }

    pub fn json(mut self, body: &impl Serialize) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("request body: {}", e)))?;
        self.body = Some(body);
        Ok(self)
    }
}

/// Sends requests to the API origin.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Send `request`, attaching `Authorization: Bearer {token}` when given.
    async fn execute(&self, request: &ApiRequest, token: Option<&str>)
        -> Result<Envelope, ApiError>;

    /// Exchange the refresh cookie for a new access token.
    async fn refresh(&self) -> Result<String, ApiError>;

    /// Cookies the backend would send to the refresh endpoint, as a
    /// `Cookie` header value.
    fn session_cookies(&self) -> Option<String>;
}

/// reqwest-backed transport with a cookie jar scoped to the API origin.
pub struct ReqwestBackend {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: String,
    refresh_url: url::Url,
}

impl ReqwestBackend {
    /// Build the client. `saved_cookies` restores a previous session's
    /// refresh cookie.
    pub fn new(config: &Config, saved_cookies: Option<&str>) -> Result<Self, ApiError> {
        let refresh_url = url::Url::parse(&format!("{}{}", config.base_url, REFRESH_PATH))
            .map_err(|e| ApiError::Decode(format!("base URL: {}", e)))?;

        let jar = Arc::new(Jar::default());
        if let Some(cookies) = saved_cookies {
            // Restored against the refresh URL so the refresh cookie is sent
            // there whatever path it was originally scoped to.
            for pair in cookies.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                jar.add_cookie_str(pair, &refresh_url);
            }
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_provider(jar.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            jar,
            base_url: config.base_url.clone(),
            refresh_url,
        })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<Envelope, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        tracing::debug!("{} {}", request.method, url);

        let mut builder = self.http.request(request.method.into(), &url);
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        parse_envelope(status, body)
    }

    async fn refresh(&self) -> Result<String, ApiError> {
        tracing::debug!("POST {}", self.refresh_url);

        let resp = self
            .http
            .post(self.refresh_url.clone())
            .header("Content-Length", "0")
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        parse_refresh(status, &body)
    }

    fn session_cookies(&self) -> Option<String> {
        self.jar
            .cookies(&self.refresh_url)
            .and_then(|v| v.to_str().ok().map(String::from))
    }
}

/// Send through `backend`, logging transport failures.
pub(crate) async fn dispatch(
    backend: &dyn HttpBackend,
    request: &ApiRequest,
    token: Option<&str>,
) -> Result<Envelope, ApiError> {
    backend.execute(request, token).await.map_err(|e| {
        tracing::error!("API network error for {} {}: {}", request.method, request.path, e);
        e
    })
}

/// Interpret a response body as an envelope regardless of HTTP status.
fn parse_envelope(status: u16, body: String) -> Result<Envelope, ApiError> {
    match serde_json::from_str::<Envelope>(&body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !(200..300).contains(&status) => Err(ApiError::Http { status, body }),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

/// Pull the new access token out of a refresh response, bare or enveloped.
fn parse_refresh(status: u16, body: &str) -> Result<String, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Http {
            status,
            body: body.to_string(),
        });
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    if value.get("success").and_then(|s| s.as_bool()) == Some(false) {
        let envelope: Envelope =
            serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;
        return Err(envelope
            .into_result()
            .err()
            .map(ApiError::from)
            .unwrap_or_else(|| ApiError::Decode("inconsistent envelope".to_string())));
    }

    value
        .get("accessToken")
        .or_else(|| value.get("data").and_then(|d| d.get("accessToken")))
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .ok_or_else(|| ApiError::Decode("refresh response missing accessToken".to_string()))
}
