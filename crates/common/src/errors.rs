//! Error types for the Palisade validation gateway
//!
//! This module defines the common error types used throughout Palisade, with a
//! focus on clear failure modes and operational visibility. Note that routine
//! validation outcomes are never errors: a rejected payload is reported as an
//! invalid result, not through this type. `GatewayError` covers the ambient
//! failure modes — bad configuration and interceptor hook failures.

use thiserror::Error;

/// Main error type for Palisade operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Interceptor before-hook failures
    #[error("Interceptor '{name}' failed: {message}")]
    Interceptor {
        name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for Palisade operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap an interceptor hook failure, preserving the hook's error chain
    pub fn interceptor(name: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Interceptor {
            name: name.into(),
            message: source.to_string(),
            source: Some(source.into()),
        }
    }

    /// Get the HTTP status code for this error
    pub fn to_http_status(&self) -> u16 {
        match self {
            Self::Config { .. } => 500,
            Self::Interceptor { .. } => 400,
        }
    }

    /// Get a client-safe error message (without internal details)
    pub fn client_message(&self) -> String {
        match self {
            Self::Config { .. } => "Internal server error".to_string(),
            Self::Interceptor { message, .. } => format!("Request rejected: {}", message),
        }
    }
}
