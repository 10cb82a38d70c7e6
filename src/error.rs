// src/error.rs

//! Unified error handling for the catalog client.
//!
//! Two layers live here:
//! - [`ApiError`] is the single normalized shape every failed backend call
//!   is reduced to. It is `Clone` so a shared in-flight fetch can hand the
//!   same failure to every waiting caller.
//! - [`AppError`] covers everything around the pipeline (configuration,
//!   files, parsing) and wraps `ApiError` when one escapes to the top.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Message used when the server gave no usable message of its own.
pub const GENERIC_SERVER_MESSAGE: &str = "An error occurred";

/// Message used when a request was sent but no response came back.
pub const CONNECTIVITY_MESSAGE: &str =
    "Network error. Please check your connection and ensure the backend is running.";

/// Detail attached to connectivity failures.
pub const CONNECTIVITY_DETAIL: &str = "No response from server";

/// Which of the three transport failure classes an [`ApiError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// The server answered with a non-success status.
    Server,
    /// The request went out but no response arrived (timeout, refused, reset).
    Connectivity,
    /// The request could not be built or sent at all.
    RequestConstruction,
}

/// Normalized error for a failed API call.
///
/// `status` is the HTTP status for [`ApiErrorKind::Server`] and `0` otherwise.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub detail: Option<String>,
    pub status: u16,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message, self.status)?;
        if let Some(detail) = &self.detail {
            if detail != &self.message {
                write!(f, ": {detail}")?;
            }
        }
        Ok(())
    }
}

impl ApiError {
    /// Build a server error from a status code and the raw response body.
    ///
    /// The message prefers the body's `message`, then its `detail`, then a
    /// generic fallback. Structured `detail` values (validation error lists)
    /// are kept as compact JSON text.
    pub fn server(status: u16, body: &[u8]) -> Self {
        let parsed: Option<Value> = serde_json::from_slice(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(value_text)
        };

        let detail = field("detail");
        let message = field("message")
            .or_else(|| detail.clone())
            .unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string());

        Self {
            kind: ApiErrorKind::Server,
            message,
            detail,
            status,
        }
    }

    /// Build a connectivity error (request sent, nothing came back).
    pub fn connectivity() -> Self {
        Self {
            kind: ApiErrorKind::Connectivity,
            message: CONNECTIVITY_MESSAGE.to_string(),
            detail: Some(CONNECTIVITY_DETAIL.to_string()),
            status: 0,
        }
    }

    /// Build a request construction error carrying the underlying message.
    pub fn request(message: impl fmt::Display) -> Self {
        let message = message.to_string();
        Self {
            kind: ApiErrorKind::RequestConstruction,
            message: if message.is_empty() {
                "An unexpected error occurred".to_string()
            } else {
                message
            },
            detail: None,
            status: 0,
        }
    }

    /// Classify a transport-level failure reported by reqwest.
    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_builder() {
            return Self::request(error);
        }
        if let Some(status) = error.status() {
            return Self::server(status.as_u16(), &[]);
        }
        Self::connectivity()
    }

    /// Whether the failure happened before any server answer.
    pub fn is_connectivity(&self) -> bool {
        self.kind == ApiErrorKind::Connectivity
    }

    /// Whether the server answered with a 404.
    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::Server && self.status == 404
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Backend call failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
