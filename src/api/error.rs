//! Failure taxonomy for the Bitbucket API client.
//!
//! Every error leaving [`BitbucketClient`](super::BitbucketClient) is exactly
//! one of these variants. Endpoints and the pagination helper pass them
//! through untouched.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;

/// Message used when a failed response carries nothing readable.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

#[derive(Debug, thiserror::Error)]
pub enum BitbucketError {
    #[error("{0}")]
    Configuration(String),

    #[error("{message}")]
    Authentication { message: String },

    #[error("{message}")]
    Permission { message: String },

    #[error("Resource not found: {message}")]
    NotFound { message: String },

    #[error("{message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("{message}")]
    Api {
        message: String,
        status: u16,
        body: Option<Value>,
    },

    #[error("{0}")]
    Transport(String),

    #[error("Invalid response from Bitbucket: {0}")]
    InvalidResponse(String),
}

/// Discriminant of a [`BitbucketError`], for callers that branch on the
/// failure class without caring about its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Authentication,
    Permission,
    NotFound,
    RateLimit,
    Api,
    Transport,
    InvalidResponse,
}

impl BitbucketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BitbucketError::Configuration(_) => ErrorKind::Configuration,
            BitbucketError::Authentication { .. } => ErrorKind::Authentication,
            BitbucketError::Permission { .. } => ErrorKind::Permission,
            BitbucketError::NotFound { .. } => ErrorKind::NotFound,
            BitbucketError::RateLimit { .. } => ErrorKind::RateLimit,
            BitbucketError::Api { .. } => ErrorKind::Api,
            BitbucketError::Transport(_) => ErrorKind::Transport,
            BitbucketError::InvalidResponse(_) => ErrorKind::InvalidResponse,
        }
    }

    /// HTTP status associated with the failure, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BitbucketError::Authentication { .. } => Some(401),
            BitbucketError::Permission { .. } => Some(403),
            BitbucketError::NotFound { .. } => Some(404),
            BitbucketError::RateLimit { .. } => Some(429),
            BitbucketError::Api { status, .. } => Some(*status),
            BitbucketError::Configuration(_)
            | BitbucketError::Transport(_)
            | BitbucketError::InvalidResponse(_) => None,
        }
    }

    /// Seconds the server asked us to wait before retrying.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            BitbucketError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Raw body of a failed response that did not map to a specific variant.
    pub fn response_body(&self) -> Option<&Value> {
        match self {
            BitbucketError::Api { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Build the typed failure for a non-success response.
    pub fn from_response(status: StatusCode, headers: &HeaderMap, body: &str) -> Self {
        let body = parse_error_body(body);
        let message = body
            .as_ref()
            .map(extract_error_message)
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());

        match status {
            StatusCode::UNAUTHORIZED => BitbucketError::Authentication { message },
            StatusCode::FORBIDDEN => BitbucketError::Permission { message },
            StatusCode::NOT_FOUND => BitbucketError::NotFound { message },
            StatusCode::TOO_MANY_REQUESTS => BitbucketError::RateLimit {
                message,
                retry_after: parse_retry_after(headers),
            },
            _ => BitbucketError::Api {
                message,
                status: status.as_u16(),
                body,
            },
        }
    }
}

impl From<reqwest::Error> for BitbucketError {
    fn from(err: reqwest::Error) -> Self {
        BitbucketError::Transport(err.to_string())
    }
}

/// Bodies that are not JSON are kept as a JSON string so that message
/// extraction treats them as plain text.
fn parse_error_body(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}

/// Pull a human readable message out of an error body.
///
/// Precedence: the body itself when it is a string, then `error.message`,
/// then a top-level `message`, then [`DEFAULT_ERROR_MESSAGE`].
pub fn extract_error_message(body: &Value) -> String {
    if let Some(text) = body.as_str() {
        return text.to_string();
    }
    if let Some(message) = body.pointer("/error/message").and_then(Value::as_str) {
        return message.to_string();
    }
    if let Some(message) = body.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    DEFAULT_ERROR_MESSAGE.to_string()
}

fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
