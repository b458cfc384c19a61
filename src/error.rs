// src/error.rs

//! Unified error handling for the trawler application.

use std::fmt;

use thiserror::Error;

/// Result type alias for trawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Classified failure of a single remote API call.
///
/// Every endpoint call that fails is sorted into one of these buckets;
/// the crawler's per-account dispatch branches on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    /// The account does not exist (HTTP 404)
    NotFound,

    /// The account is protected or the credentials lack access (HTTP 401/403)
    Forbidden,

    /// The quota window is exhausted despite the pre-call wait (HTTP 429)
    RateLimited,

    /// Anything else: transport errors, 5xx, malformed payloads
    Other(String),
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::NotFound => write!(f, "not found"),
            ApiFailure::Forbidden => write!(f, "forbidden"),
            ApiFailure::RateLimited => write!(f, "rate limited"),
            ApiFailure::Other(detail) => write!(f, "{}", detail),
        }
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Classified API call failure
    #[error("API failure: {0}")]
    Api(ApiFailure),
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

    /// Create an unclassified API failure.
    pub fn api_other(message: impl fmt::Display) -> Self {
        Self::Api(ApiFailure::Other(message.to_string()))
    }

    /// The API classification of this error, if it has one.
    pub fn api_failure(&self) -> Option<&ApiFailure> {
        match self {
            AppError::Api(failure) => Some(failure),
            _ => None,
        }
    }
}
