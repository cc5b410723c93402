use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The platform answered with a non-2xx status.
    #[error("{}", rejection_message(.status, .body))]
    Rejected { status: StatusCode, body: Value },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

fn rejection_message(status: &StatusCode, body: &Value) -> String {
    match body.get("message").and_then(Value::as_str) {
        Some(message) => message.to_string(),
        None => format!("HTTP {}", status),
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build a rejection from a status and raw body. JSON bodies are kept
    /// structured; anything else is stored as a truncated string.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = serde_json::from_str::<Value>(body)
            .unwrap_or_else(|_| Value::String(Self::truncate_body(body)));
        ApiError::Rejected { status, body }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::NetworkError(e) => e.status(),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Server-provided `message` field of a rejection body, if any.
    pub fn message(&self) -> Option<&str> {
        self.body()?.get("message")?.as_str()
    }
}
