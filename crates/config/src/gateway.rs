//! Top-level gateway configuration.

use palisade_common::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::api::{ApiValidationConfig, CsrfConfig};

/// Configuration for the validation gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Enable validation of free-form input payloads
    pub enable_input_validation: bool,
    /// Enable validation of wire-level API requests
    pub enable_api_validation: bool,
    /// Enable sanitization (HTML/SQL neutralization, sensitive-field redaction)
    pub enable_sanitization: bool,
    /// Enable per-client rate limiting
    pub enable_rate_limit: bool,
    /// Enable the validation result cache
    pub enable_caching: bool,
    /// Strict mode: schema conformance additionally flags nulls and empty strings
    pub strict_mode: bool,
    /// Caller-side hint carried on requests built by the convenience entry
    /// points; does not change the gateway's own execution model
    pub validate_async: bool,
    /// Per-call processing budget in seconds
    pub timeout_secs: u64,
    /// Result cache sizing and expiry
    pub cache: CacheConfig,
    /// Sliding-window rate limiter settings
    pub rate_limit: RateLimitConfig,
    /// Wire-level API request checks
    pub api: ApiValidationConfig,
    /// CSRF / origin protection
    pub csrf: CsrfConfig,
    /// Fields that must be present in every form submission
    pub required_form_fields: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enable_input_validation: true,
            enable_api_validation: true,
            enable_sanitization: true,
            enable_rate_limit: true,
            enable_caching: true,
            strict_mode: false,
            validate_async: false,
            timeout_secs: 5,
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            api: ApiValidationConfig::default(),
            csrf: CsrfConfig::default(),
            required_form_fields: vec!["csrf_token".to_string()],
        }
    }
}

impl GatewayConfig {
    /// Per-call processing budget
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> GatewayResult<()> {
        if self.timeout_secs == 0 {
            return Err(GatewayError::config("timeout_secs must be greater than 0"));
        }
        self.cache.validate()?;
        self.rate_limit.validate()?;
        self.api.validate()?;
        self.csrf.validate()?;
        Ok(())
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live for cached results, in seconds
    pub ttl_secs: u64,
    /// Maximum number of cached results before oldest-insertion eviction
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 1000,
        }
    }
}

impl CacheConfig {
    /// Entry time-to-live
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    fn validate(&self) -> GatewayResult<()> {
        if self.ttl_secs == 0 {
            return Err(GatewayError::config("cache.ttl_secs must be greater than 0"));
        }
        if self.max_entries == 0 {
            return Err(GatewayError::config(
                "cache.max_entries must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Sliding-window rate limiter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per client per window
    pub max_requests: u32,
    /// Window duration in seconds
    pub window_secs: u64,
    /// Soft bound on distinct tracked clients; exceeding it triggers an
    /// idle-entry sweep so the counter map cannot grow without bound
    pub max_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
            max_clients: 10_000,
        }
    }
}

impl RateLimitConfig {
    /// Window duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    fn validate(&self) -> GatewayResult<()> {
        if self.max_requests == 0 {
            return Err(GatewayError::config(
                "rate_limit.max_requests must be greater than 0",
            ));
        }
        if self.window_secs == 0 {
            return Err(GatewayError::config(
                "rate_limit.window_secs must be greater than 0",
            ));
        }
        if self.max_clients == 0 {
            return Err(GatewayError::config(
                "rate_limit.max_clients must be greater than 0",
            ));
        }
        Ok(())
    }
}
