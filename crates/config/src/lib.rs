//! Configuration types for the Palisade validation gateway
//!
//! All knobs are optional with stated defaults, so `GatewayConfig::default()`
//! (or an empty deserialized document) yields a fully working gateway:
//! every validation kind enabled, a 5 minute / 1000 entry cache, a
//! 100-requests-per-minute rate limit, a 5 second per-call budget, and CSRF
//! protection on with no origin restriction.
//!
//! Configurations are validated up front via [`GatewayConfig::validate`];
//! the gateway refuses to construct from a config that fails validation.

mod api;
mod gateway;

pub use api::{ApiValidationConfig, CsrfConfig};
pub use gateway::{CacheConfig, GatewayConfig, RateLimitConfig};
