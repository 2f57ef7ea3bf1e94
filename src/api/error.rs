//! Errors surfaced by API calls

use thiserror::Error;

/// Failure of an API call as seen by the caller.
///
/// Clone so that one failed token refresh can reject every parked request.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Connection failure or timeout
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx response whose body was not an envelope
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// Envelope with `success: false`
    #[error("API error {code}: {}", .message.as_deref().unwrap_or("no detail"))]
    Business {
        code: i64,
        message: Option<String>,
        data: Option<serde_json::Value>,
    },
    /// The access token could not be renewed; the session is gone
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("too many requests waiting for token refresh (limit {0})")]
    QueueFull(usize),
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    #[cfg(test)]
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Business { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
