//! Palisade Validation Gateway
//!
//! A request-time subsystem that inspects, sanitizes, rate-limits, caches,
//! and scores inbound data — free-form input payloads, wire-level API
//! requests, and form submissions — before it reaches business logic.
//!
//! The gateway is a library: it performs no I/O, holds no global state, and
//! is designed for many concurrent validation calls executing in parallel
//! threads. Its core components:
//!
//! - **Sanitizer**: HTML-tag stripping, entity escaping, SQL-pattern removal,
//!   and sensitive-field redaction
//! - **Rate Limiter**: per-client sliding-window counting with block-out
//! - **Validation Cache**: bounded, time-boxed result cache keyed by a
//!   deterministic digest of request shape
//! - **Checkers**: independent validators per payload kind, accumulating
//!   every violation rather than aborting on the first
//! - **Interceptor Chain**: pluggable before/after hooks around the checkers
//! - **Metrics**: process-lifetime counters, latency, and cache-hit rate
//!
//! # Example
//!
//! ```
//! use palisade_gateway::{Gateway, GatewayConfig};
//! use serde_json::json;
//!
//! let gateway = Gateway::new(GatewayConfig::default()).expect("default config is valid");
//!
//! let response = gateway.validate_input(json!({"email": "user@example.com"}), None);
//! assert!(response.valid);
//!
//! let response = gateway.validate_input(json!({"email": "not-an-email"}), None);
//! assert!(!response.valid);
//! ```

pub mod cache;
pub mod check;
pub mod gateway;
pub mod http;
pub mod interceptor;
pub mod metrics;
pub mod rate_limit;
pub mod sanitize;
pub mod types;

// Orchestrator
pub use gateway::Gateway;

// HTTP boundary
pub use http::{check_http_request, rejection_response, RejectionBody};

// Core data model
pub use types::{
    codes, ApiRequest, Payload, PayloadKind, Severity, ValidationRequest, ValidationResponse,
    ValidationResult, Violation,
};

// Components, for callers embedding them individually
pub use cache::ValidationCache;
pub use check::{ApiChecker, Checked, FormChecker, InputChecker, PayloadChecker};
pub use interceptor::{Interceptor, InterceptorChain};
pub use metrics::{GatewayMetrics, MetricsSnapshot};
pub use rate_limit::SlidingWindowLimiter;
pub use sanitize::{is_sensitive_field, sanitize, sanitize_str, REDACTED};

// Re-export the companion crates' surface for convenience
pub use palisade_common::{CancelToken, ClientId, GatewayError, GatewayResult, RequestId};
pub use palisade_config::{
    ApiValidationConfig, CacheConfig, CsrfConfig, GatewayConfig, RateLimitConfig,
};
