//! Common utilities and shared components for the Palisade validation gateway
//!
//! This crate provides shared functionality used across all Palisade components,
//! including the error taxonomy, type-safe identifiers, cooperative cancellation,
//! and tracing initialization.
//!
//! # Module Organization
//!
//! - [`ids`]: Type-safe identifier newtypes (RequestId, ClientId)
//! - [`errors`]: Error types and result aliases
//! - [`cancel`]: Cooperative cancellation token for in-flight validations
//! - [`observability`]: Tracing/logging initialization

pub mod cancel;
pub mod errors;
pub mod ids;
pub mod observability;

// Re-export commonly used items at the crate root
pub use cancel::CancelToken;
pub use errors::{GatewayError, GatewayResult};
pub use ids::{ClientId, RequestId};
pub use observability::init_tracing;
