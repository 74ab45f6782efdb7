use std::fmt;

use serde_json::Value;

/// Failure of a single API call. Every variant collapses to one display string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection refused, DNS failure, reset, ...
    Transport(String),
    /// A 2xx response whose body was not what we expected.
    Decode(String),
    /// Non-2xx status.
    Status { status: u16, message: String },
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: message.into(),
        }
    }

    /// Uses the server's `detail` when the body carries one, else `fallback`.
    pub fn status_with_detail(status: u16, body: &str, fallback: &str) -> Self {
        let message = extract_detail(body).unwrap_or_else(|| fallback.to_string());
        ApiError::status(status, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(message) | ApiError::Decode(message) => write!(f, "{message}"),
            ApiError::Status { message, .. } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(format!("Invalid response: {err}"))
        } else if err.is_timeout() {
            ApiError::Transport(format!("Request timed out: {err}"))
        } else if err.is_connect() {
            ApiError::Transport(format!("Connection failed: {err}"))
        } else {
            ApiError::Transport(format!("Network error: {err}"))
        }
    }
}

// FastAPI sends `{"detail": "..."}` for HTTPException and
// `{"detail": [{"msg": "...", ...}]}` for validation failures.
fn extract_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let detail = match json.get("detail")? {
        Value::String(detail) => detail.clone(),
        Value::Array(items) => items.first()?.get("msg")?.as_str()?.to_string(),
        _ => return None,
    };
    if detail.is_empty() {
        None
    } else {
        Some(detail)
    }
}
