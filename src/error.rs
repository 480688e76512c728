//! Error types for wastewise-gate
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors that are part of the API,
//! and convert to HTTP responses at the transport boundary.

use crate::auth::TokenPair;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid cookie name '{name}' in {field}")]
    InvalidCookieName { name: String, field: String },
}

/// Errors from the auth/data backend REST surface
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited by backend")]
    RateLimited,

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Unauthorized: invalid or expired credentials")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Create an appropriate error from an HTTP status code and response body
    pub fn from_response(status: u16, body: &str) -> Self {
        match status {
            401 => BackendError::Unauthorized,
            403 => BackendError::Forbidden(if body.is_empty() {
                "access denied".into()
            } else {
                body.to_string()
            }),
            // PostgREST answers 406 when a single-object request matched no rows
            404 | 406 => BackendError::NotFound {
                resource: "requested row".into(),
            },
            429 => BackendError::RateLimited,
            _ => BackendError::Api {
                status,
                message: if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                },
            },
        }
    }

    /// Whether the backend itself could not serve the request
    /// (as opposed to rejecting the caller's credentials).
    pub fn is_unavailable(&self) -> bool {
        match self {
            BackendError::Request(_) | BackendError::RateLimited => true,
            BackendError::Api { status, .. } => *status >= 500,
            BackendError::InvalidResponse(_) => true,
            _ => false,
        }
    }
}

/// Identity provider errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Identity provider unavailable: {0}")]
    Unavailable(#[source] BackendError),

    /// The refresh grant succeeded (revoking the old refresh token) but the
    /// user behind the new tokens could not be fetched
    #[error("Identity provider unavailable after token refresh: {source}")]
    UnavailableAfterRefresh {
        pair: TokenPair,
        #[source]
        source: BackendError,
    },

    #[error("Sign-out failed: {0}")]
    SignOut(#[source] BackendError),
}

impl AuthError {
    /// Tokens issued before the failure, which the client must still receive
    pub fn rotated_pair(&self) -> Option<&TokenPair> {
        match self {
            AuthError::UnavailableAfterRefresh { pair, .. } => Some(pair),
            _ => None,
        }
    }
}

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bind address: {0}")]
    Bind(#[from] std::net::AddrParseError),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Invalid upstream URL: {0}")]
    InvalidUpstream(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;
