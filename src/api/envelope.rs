//! Response envelope shared by every endpoint
//!
//! `{ "success": bool, "code": int, "data": any, "message": string }`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// The failed half of an envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub code: i64,
    pub message: Option<String>,
    pub data: Option<Value>,
}

impl Envelope {
    #[cfg(test)]
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            code: 200,
            data: Some(data),
            message: None,
        }
    }

    #[cfg(test)]
    pub fn failure(code: i64, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Split into the payload (`Null` when absent) or the rejection.
    pub fn into_result(self) -> Result<Value, Rejection> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(Rejection {
                code: self.code,
                message: self.message,
                data: self.data,
            })
        }
    }
}

impl Rejection {
    /// 4xx-class codes signal that the access token should be renewed.
    pub fn is_expiry(&self) -> bool {
        self.code / 100 == 4
    }
}

impl From<Rejection> for ApiError {
    fn from(r: Rejection) -> Self {
        ApiError::Business {
            code: r.code,
            message: r.message,
            data: r.data,
        }
    }
}
