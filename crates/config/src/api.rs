//! Wire-level API request and CSRF protection settings.

use palisade_common::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};

/// Checks applied to wire-level API request descriptors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiValidationConfig {
    /// Hard ceiling on the declared payload size in bytes
    pub max_request_bytes: u64,
    /// Content types accepted for request bodies (substring match, so
    /// parameterized values like `application/json; charset=utf-8` pass)
    pub allowed_content_types: Vec<String>,
    /// Headers that must be present on every request (lower-case names)
    pub required_headers: Vec<String>,
}

impl Default for ApiValidationConfig {
    fn default() -> Self {
        Self {
            max_request_bytes: 10 * 1024 * 1024,
            allowed_content_types: vec![
                "application/json".to_string(),
                "application/x-www-form-urlencoded".to_string(),
                "multipart/form-data".to_string(),
                "text/plain".to_string(),
            ],
            required_headers: vec!["user-agent".to_string()],
        }
    }
}

impl ApiValidationConfig {
    pub(crate) fn validate(&self) -> GatewayResult<()> {
        if self.max_request_bytes == 0 {
            return Err(GatewayError::config(
                "api.max_request_bytes must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// CSRF / origin protection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Whether origin checking and anti-forgery token validation run at all
    pub enabled: bool,
    /// Origins allowed to originate requests; empty means no origin restriction
    pub allowed_origins: Vec<String>,
    /// Name of the anti-forgery token field in form submissions
    pub token_field: String,
    /// Minimum accepted token length
    pub min_token_len: usize,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: Vec::new(),
            token_field: "csrf_token".to_string(),
            min_token_len: 32,
        }
    }
}

impl CsrfConfig {
    pub(crate) fn validate(&self) -> GatewayResult<()> {
        if self.token_field.is_empty() {
            return Err(GatewayError::config("csrf.token_field must not be empty"));
        }
        if self.min_token_len == 0 {
            return Err(GatewayError::config(
                "csrf.min_token_len must be greater than 0",
            ));
        }
        Ok(())
    }
}
