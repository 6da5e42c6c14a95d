//! The gateway orchestrator.
//!
//! Public entry point composing the rate limiter, result cache, interceptor
//! chain, type-specific checkers, and metrics into one request/response cycle
//! per validation call. Each call is processed end-to-end by the calling
//! thread; the only shared state is the three lock-guarded structures owned
//! here, and no lock is held across a checker or interceptor invocation.
//!
//! Rejections are always structured invalid results. The public entry points
//! never return an error or panic for routine traffic; the one hard failure
//! mode is a payload body that does not match its declared kind, which is
//! reported as an `unknown_validation_type` violation.

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use palisade_common::{CancelToken, GatewayResult, RequestId};
use palisade_config::GatewayConfig;

use crate::cache::ValidationCache;
use crate::check::{ApiChecker, FormChecker, InputChecker, PayloadChecker};
use crate::interceptor::{Interceptor, InterceptorChain};
use crate::metrics::{GatewayMetrics, MetricsSnapshot};
use crate::rate_limit::SlidingWindowLimiter;
use crate::types::{
    codes, ApiRequest, Payload, PayloadKind, ValidationRequest, ValidationResponse,
    ValidationResult,
};

/// The validation gateway.
///
/// Holds the per-process shared state explicitly — the per-client rate-limit
/// counters, the result cache, and the metrics aggregate — constructed once
/// and passed by reference wherever validations run.
pub struct Gateway {
    config: GatewayConfig,
    limiter: SlidingWindowLimiter,
    cache: ValidationCache,
    metrics: GatewayMetrics,
    interceptors: InterceptorChain,
    input_checker: InputChecker,
    api_checker: ApiChecker,
    form_checker: FormChecker,
}

impl Gateway {
    /// Construct a gateway from a validated configuration.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;
        debug!(
            rate_limit = config.enable_rate_limit,
            caching = config.enable_caching,
            sanitization = config.enable_sanitization,
            strict_mode = config.strict_mode,
            "Creating validation gateway"
        );

        Ok(Self {
            limiter: SlidingWindowLimiter::new(
                config.rate_limit.max_requests,
                config.rate_limit.window(),
                config.rate_limit.max_clients,
            ),
            cache: ValidationCache::new(config.cache.max_entries, config.cache.ttl()),
            metrics: GatewayMetrics::new(),
            interceptors: InterceptorChain::new(),
            input_checker: InputChecker::new(config.enable_sanitization, config.strict_mode),
            api_checker: ApiChecker::new(config.api.clone(), config.csrf.clone()),
            form_checker: FormChecker::new(
                config.enable_sanitization,
                config.required_form_fields.clone(),
                config.csrf.clone(),
            ),
            config,
        })
    }

    /// Register an interceptor; hooks run in registration order.
    pub fn register_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.register(interceptor);
    }

    /// Validate a free-form input payload against an optional schema.
    pub fn validate_input(&self, payload: Value, schema: Option<Value>) -> ValidationResponse {
        let mut request = ValidationRequest::new(PayloadKind::Input, Payload::Json(payload))
            .with_timeout(self.config.timeout())
            .with_async(self.config.validate_async);
        if let Some(schema) = schema {
            request = request.with_schema(schema);
        }
        self.validate(request)
    }

    /// Validate a wire-level API request descriptor.
    ///
    /// The rate-limit client identity is derived from the descriptor itself.
    pub fn validate_api_request(&self, api_request: ApiRequest) -> ValidationResponse {
        let client_id = api_request.client_id();
        let request = ValidationRequest::new(PayloadKind::Api, Payload::Api(api_request))
            .with_client(client_id)
            .with_timeout(self.config.timeout())
            .with_async(self.config.validate_async);
        self.validate(request)
    }

    /// Validate a form submission against an optional schema.
    pub fn validate_form(&self, fields: Value, schema: Option<Value>) -> ValidationResponse {
        let mut request = ValidationRequest::new(PayloadKind::Form, Payload::Json(fields))
            .with_timeout(self.config.timeout())
            .with_async(self.config.validate_async);
        if let Some(schema) = schema {
            request = request.with_schema(schema);
        }
        self.validate(request)
    }

    /// Run one validation through the full pipeline.
    ///
    /// Phases, in order: rate limit, per-kind enable flag, cache lookup,
    /// before-interceptors, checker, after-interceptors, cache store, metrics.
    /// The deadline budget and the cancellation token are polled before each
    /// phase transition; both yield structured invalid results rather than
    /// aborting, and neither can leave a shared map half-updated since every
    /// map mutation is atomic under its own lock.
    pub fn validate(&self, request: ValidationRequest) -> ValidationResponse {
        let ValidationRequest {
            id,
            kind,
            payload,
            schema,
            client_id,
            timeout,
            created_at,
            cancel,
            ..
        } = request;

        trace!(
            request_id = %id,
            kind = %kind,
            client_id = %client_id,
            "Validation received"
        );

        if self.config.enable_rate_limit && !self.limiter.allow(client_id.as_str()) {
            // Counted only by the rate-limit-hit metric, not as a normal
            // failure, and with no cache interaction.
            self.metrics.record_rate_limit_hit();
            debug!(request_id = %id, client_id = %client_id, "Validation rate limited");
            return ValidationResponse {
                request_id: id,
                valid: false,
                result: ValidationResult::rejected(
                    codes::RATE_LIMIT_EXCEEDED,
                    "Rate limit exceeded",
                    "",
                ),
                sanitized: None,
                cached: false,
                duration: created_at.elapsed(),
            };
        }

        if !self.kind_enabled(kind) {
            trace!(request_id = %id, kind = %kind, "Validation disabled for kind");
            return self.finish(id, kind, created_at, ValidationResult::ok(), None, false);
        }

        if let Some(result) = interrupted(cancel.as_ref(), created_at, timeout) {
            return self.finish(id, kind, created_at, result, None, false);
        }

        let cache_key = self
            .config
            .enable_caching
            .then(|| ValidationCache::key(kind, &payload.as_json(), schema.as_ref()));
        if let Some(key) = cache_key {
            if let Some(result) = self.cache.get(key) {
                debug!(request_id = %id, kind = %kind, "Validation served from cache");
                return self.finish(id, kind, created_at, result, None, true);
            }
        }

        if let Some(result) = interrupted(cancel.as_ref(), created_at, timeout) {
            return self.finish(id, kind, created_at, result, None, false);
        }

        let payload = match self.interceptors.run_before(payload) {
            Ok(payload) => payload,
            Err(err) => {
                // Fail fast: no checker, no sanitization, no cache write.
                let result =
                    ValidationResult::rejected(codes::INTERCEPTOR_ERROR, err.client_message(), "");
                return self.finish(id, kind, created_at, result, None, false);
            }
        };

        if let Some(result) = interrupted(cancel.as_ref(), created_at, timeout) {
            return self.finish(id, kind, created_at, result, None, false);
        }

        let checked = self.checker_for(kind).check(&payload, schema.as_ref());

        if let Some(result) = interrupted(cancel.as_ref(), created_at, timeout) {
            return self.finish(id, kind, created_at, result, checked.sanitized, false);
        }

        let result = self.interceptors.run_after(&payload, checked.result);

        if let Some(key) = cache_key {
            // The cache refuses invalid results; the guard here just skips
            // the write lock for them.
            if result.valid {
                self.cache.set(key, result.clone());
            }
        }

        self.finish(id, kind, created_at, result, checked.sanitized, false)
    }

    /// Merged aggregate view: validation counters plus the cache and
    /// rate-limiter occupancy figures the gateway owns.
    pub fn metrics(&self) -> MetricsSnapshot {
        let mut snapshot = self.metrics.snapshot();
        snapshot.cache_hits = self.cache.hits();
        snapshot.cache_misses = self.cache.misses();
        snapshot.cache_hit_rate = self.cache.hit_rate();
        snapshot.cache_entries = self.cache.len();
        snapshot.tracked_clients = self.limiter.tracked_clients();
        snapshot
    }

    /// Remove rate-limit counters idle longer than `max_age`.
    ///
    /// The limiter also sweeps opportunistically when its map fills; this
    /// entry point lets an embedding process run the sweep on a timer.
    pub fn sweep_idle_clients(&self, max_age: Duration) -> usize {
        self.limiter.sweep_idle(max_age)
    }

    /// The configuration this gateway was constructed with.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn kind_enabled(&self, kind: PayloadKind) -> bool {
        match kind {
            PayloadKind::Input => self.config.enable_input_validation,
            PayloadKind::Api => self.config.enable_api_validation,
            PayloadKind::Form => true,
        }
    }

    fn checker_for(&self, kind: PayloadKind) -> &dyn PayloadChecker {
        match kind {
            PayloadKind::Input => &self.input_checker,
            PayloadKind::Api => &self.api_checker,
            PayloadKind::Form => &self.form_checker,
        }
    }

    /// Meter a completed call and wrap its result with delivery metadata.
    fn finish(
        &self,
        id: RequestId,
        kind: PayloadKind,
        started: Instant,
        result: ValidationResult,
        sanitized: Option<Value>,
        cached: bool,
    ) -> ValidationResponse {
        let duration = started.elapsed();
        self.metrics
            .record_validation(kind, result.valid, cached, duration);
        trace!(
            request_id = %id,
            kind = %kind,
            valid = result.valid,
            cached = cached,
            violations = result.violations.len(),
            duration_us = duration.as_micros() as u64,
            "Validation completed"
        );
        ValidationResponse {
            request_id: id,
            valid: result.valid,
            result,
            sanitized,
            cached,
            duration,
        }
    }
}

/// Poll the advisory deadline and cancellation token between phases.
fn interrupted(
    cancel: Option<&CancelToken>,
    started: Instant,
    timeout: Duration,
) -> Option<ValidationResult> {
    if cancel.is_some_and(|token| token.is_cancelled()) {
        return Some(ValidationResult::rejected(
            codes::VALIDATION_CANCELLED,
            "Validation cancelled by caller",
            "",
        ));
    }
    if started.elapsed() >= timeout {
        return Some(ValidationResult::rejected(
            codes::VALIDATION_TIMEOUT,
            "Validation exceeded its processing budget",
            "",
        ));
    }
    None
}
