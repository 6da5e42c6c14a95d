//! Pluggable interception around the type-specific checkers.
//!
//! Interceptors are registered once and run on every validation call. The
//! before phase runs in registration order and may transform the payload or
//! abort the call by returning an error; the orchestrator then rejects without
//! running the checker or touching the cache. The after phase is a fold over
//! every registered interceptor unconditionally, each receiving the previous
//! one's result — an interceptor can downgrade or upgrade severity, attach
//! metadata, or log, but can only erase an upstream failure by explicitly
//! overriding `valid`.

use std::sync::Arc;
use tracing::{debug, trace, warn};

use palisade_common::{GatewayError, GatewayResult};

use crate::types::{Payload, ValidationResult};

/// A pluggable validation hook.
///
/// Both capability methods default to pass-through, so implementers override
/// only the phase they care about.
pub trait Interceptor: Send + Sync {
    /// Stable name for logging and error attribution.
    fn name(&self) -> &str;

    /// Runs before the checker; may transform the payload or abort with an
    /// error.
    fn before(&self, payload: Payload) -> anyhow::Result<Payload> {
        Ok(payload)
    }

    /// Runs after the checker; receives the previous interceptor's result and
    /// returns the (possibly rewritten) result to pass on.
    fn after(&self, _payload: &Payload, result: ValidationResult) -> ValidationResult {
        result
    }
}

/// Ordered collection of registered interceptors.
#[derive(Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor; the chain runs in registration order.
    pub fn register(&mut self, interceptor: Arc<dyn Interceptor>) {
        debug!(interceptor = interceptor.name(), "Registering interceptor");
        self.interceptors.push(interceptor);
    }

    /// Number of registered interceptors.
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run the before phase, short-circuiting on the first error.
    pub fn run_before(&self, mut payload: Payload) -> GatewayResult<Payload> {
        for interceptor in &self.interceptors {
            trace!(interceptor = interceptor.name(), "Running before-hook");
            payload = interceptor.before(payload).map_err(|err| {
                warn!(
                    interceptor = interceptor.name(),
                    error = %err,
                    "Before-hook aborted validation"
                );
                GatewayError::interceptor(interceptor.name(), err)
            })?;
        }
        Ok(payload)
    }

    /// Run the after phase as an unconditional fold.
    pub fn run_after(&self, payload: &Payload, mut result: ValidationResult) -> ValidationResult {
        for interceptor in &self.interceptors {
            trace!(interceptor = interceptor.name(), "Running after-hook");
            result = interceptor.after(payload, result);
        }
        result
    }
}
