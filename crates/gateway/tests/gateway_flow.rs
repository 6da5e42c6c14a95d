//! Integration tests for the validation gateway.
//!
//! These tests exercise the full request/response cycle — rate limiting,
//! caching, interceptors, checkers, and metrics — through the public entry
//! points, the way an embedding HTTP or form-handling layer would.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;

use palisade_gateway::{
    check_http_request, codes, ApiRequest, Gateway, GatewayConfig, Interceptor, Payload,
    PayloadKind, RateLimitConfig, ValidationRequest, ValidationResult, REDACTED,
};

fn gateway(config: GatewayConfig) -> Gateway {
    Gateway::new(config).expect("config should validate")
}

// ============================================================================
// Checker Scenarios
// ============================================================================

#[test]
fn test_invalid_email_scenario() {
    let gateway = gateway(GatewayConfig::default());

    let response = gateway.validate_input(json!({"email": "not-an-email"}), None);
    assert!(!response.valid);
    assert_eq!(response.result.violations.len(), 1);
    let violation = &response.result.violations[0];
    assert_eq!(violation.code, codes::INVALID_EMAIL);
    assert_eq!(violation.field, "email");
}

#[test]
fn test_oversized_api_request_scenario() {
    let gateway = gateway(GatewayConfig::default());

    let request = ApiRequest::new("POST", "/upload")
        .with_header("User-Agent", "integration-test/1.0")
        .with_header("Content-Type", "application/json")
        .with_content_length(11_000_000);

    let response = gateway.validate_api_request(request);
    assert!(!response.valid);
    assert!(response.result.has_code(codes::REQUEST_TOO_LARGE));
}

#[test]
fn test_form_password_redaction_scenario() {
    let gateway = gateway(GatewayConfig::default());

    let response = gateway.validate_form(
        json!({
            "csrf_token": "a".repeat(48),
            "password": "secret123",
            "email": "user@example.com",
        }),
        None,
    );
    assert!(response.valid, "{:?}", response.result.violations);
    let sanitized = response.sanitized.expect("sanitization is on by default");
    assert_eq!(sanitized["password"], REDACTED);
    assert_eq!(sanitized["email"], "user@example.com");
}

#[test]
fn test_schema_violations_reported_through_gateway() {
    let gateway = gateway(GatewayConfig::default());
    let schema = json!({
        "type": "object",
        "properties": {"age": {"type": "integer", "minimum": 0}},
        "required": ["name"]
    });

    let response = gateway.validate_input(json!({"age": -1}), Some(schema));
    assert!(!response.valid);
    assert!(response.result.has_code(codes::SCHEMA_VIOLATION));
    assert!(response.result.violations.len() >= 2);
}

// ============================================================================
// Rate Limiting
// ============================================================================

#[test]
fn test_101_calls_within_window_at_default_limit() {
    let gateway = gateway(GatewayConfig::default());
    let request = || {
        ApiRequest::new("GET", "/api/items")
            .with_header("User-Agent", "integration-test/1.0")
            .with_header("X-Client-ID", "X")
    };

    for i in 0..100 {
        let response = gateway.validate_api_request(request());
        assert!(response.valid, "call {} should be allowed", i + 1);
    }

    let before = gateway.metrics();
    let response = gateway.validate_api_request(request());
    assert!(!response.valid, "call 101 must be denied");
    assert!(response.result.has_code(codes::RATE_LIMIT_EXCEEDED));

    // No cache interaction for the denied call
    let after = gateway.metrics();
    assert_eq!(after.cache_hits, before.cache_hits);
    assert_eq!(after.cache_misses, before.cache_misses);
    assert_eq!(after.rate_limit_hits, 1);
}

#[test]
fn test_clients_are_limited_independently() {
    let mut config = GatewayConfig::default();
    config.rate_limit = RateLimitConfig {
        max_requests: 2,
        window_secs: 60,
        max_clients: 100,
    };
    let gateway = gateway(config);
    let request = |client: &str| {
        ApiRequest::new("GET", "/api")
            .with_header("User-Agent", "t")
            .with_header("X-Client-ID", client)
    };

    assert!(gateway.validate_api_request(request("a")).valid);
    assert!(gateway.validate_api_request(request("a")).valid);
    assert!(!gateway.validate_api_request(request("a")).valid);
    assert!(gateway.validate_api_request(request("b")).valid);
}

// ============================================================================
// Caching
// ============================================================================

#[test]
fn test_structurally_identical_requests_share_a_cache_entry() {
    let gateway = gateway(GatewayConfig::default());

    let first = gateway.validate_input(json!({"alpha": 1, "beta": 2}), None);
    // Same shape, different field order
    let second = gateway.validate_input(json!({"beta": 2, "alpha": 1}), None);

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(gateway.metrics().cache_entries, 1);
}

#[test]
fn test_cache_disabled_recomputes_every_call() {
    let mut config = GatewayConfig::default();
    config.enable_caching = false;
    let gateway = gateway(config);

    let payload = json!({"name": "Ada"});
    assert!(!gateway.validate_input(payload.clone(), None).cached);
    assert!(!gateway.validate_input(payload, None).cached);
    assert_eq!(gateway.metrics().cache_entries, 0);
}

#[test]
fn test_only_valid_results_populate_the_cache() {
    let gateway = gateway(GatewayConfig::default());

    gateway.validate_input(json!({"email": "nope"}), None);
    gateway.validate_input(json!({"email": "ok@example.com"}), None);

    assert_eq!(gateway.metrics().cache_entries, 1);
}

// ============================================================================
// Interceptors
// ============================================================================

struct RejectAll;

impl Interceptor for RejectAll {
    fn name(&self) -> &str {
        "reject-all"
    }

    fn before(&self, _payload: Payload) -> anyhow::Result<Payload> {
        anyhow::bail!("refused by policy")
    }
}

struct TrimStrings;

impl Interceptor for TrimStrings {
    fn name(&self) -> &str {
        "trim-strings"
    }

    fn before(&self, payload: Payload) -> anyhow::Result<Payload> {
        match payload {
            Payload::Json(value) => Ok(Payload::Json(trim(value))),
            other => Ok(other),
        }
    }
}

fn trim(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => serde_json::Value::String(s.trim().to_string()),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(trim).collect())
        }
        serde_json::Value::Object(map) => {
            serde_json::Value::Object(map.into_iter().map(|(k, v)| (k, trim(v))).collect())
        }
        other => other,
    }
}

struct TagResult(AtomicUsize);

impl Interceptor for TagResult {
    fn name(&self) -> &str {
        "tag-result"
    }

    fn after(&self, _payload: &Payload, mut result: ValidationResult) -> ValidationResult {
        self.0.fetch_add(1, Ordering::SeqCst);
        result.metadata.insert("tagged".to_string(), json!(true));
        result
    }
}

#[test]
fn test_before_error_skips_checker_and_cache() {
    let mut gateway = gateway(GatewayConfig::default());
    gateway.register_interceptor(Arc::new(RejectAll));

    // Would produce invalid_email if the checker ran
    let response = gateway.validate_input(json!({"email": "nope"}), None);

    assert!(!response.valid);
    assert!(response.result.has_code(codes::INTERCEPTOR_ERROR));
    assert!(!response.result.has_code(codes::INVALID_EMAIL));
    assert!(response.sanitized.is_none());
    assert_eq!(gateway.metrics().cache_entries, 0);
}

#[test]
fn test_before_hook_transforms_reach_the_checker() {
    let mut gateway = gateway(GatewayConfig::default());
    gateway.register_interceptor(Arc::new(TrimStrings));

    // Valid only after trimming
    let response = gateway.validate_input(json!({"email": "  user@example.com  "}), None);
    assert!(response.valid, "{:?}", response.result.violations);
    assert_eq!(
        response.sanitized.expect("sanitization ran")["email"],
        "user@example.com"
    );
}

#[test]
fn test_after_hooks_run_on_failures_too() {
    let mut gateway = gateway(GatewayConfig::default());
    let tagger = Arc::new(TagResult(AtomicUsize::new(0)));
    gateway.register_interceptor(tagger.clone());

    let response = gateway.validate_input(json!({"email": "nope"}), None);
    assert!(!response.valid);
    assert_eq!(response.result.metadata["tagged"], json!(true));
    assert_eq!(tagger.0.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cache_hits_skip_the_interceptor_chain() {
    let mut gateway = gateway(GatewayConfig::default());
    let tagger = Arc::new(TagResult(AtomicUsize::new(0)));
    gateway.register_interceptor(tagger.clone());

    gateway.validate_input(json!({"name": "Ada"}), None);
    let cached = gateway.validate_input(json!({"name": "Ada"}), None);

    assert!(cached.cached);
    assert_eq!(tagger.0.load(Ordering::SeqCst), 1, "after-hook ran once");
}

// ============================================================================
// HTTP Boundary
// ============================================================================

#[test]
fn test_http_cycle_passes_and_rejects() {
    let gateway = gateway(GatewayConfig::default());

    let ok = http::Request::builder()
        .method("POST")
        .uri("/api/items")
        .header("User-Agent", "integration-test/1.0")
        .header("Content-Type", "application/json")
        .body(())
        .unwrap();
    assert!(check_http_request(&gateway, &ok).is_ok());

    let oversized = http::Request::builder()
        .method("POST")
        .uri("/api/items")
        .header("User-Agent", "integration-test/1.0")
        .header("Content-Type", "application/json")
        .header("Content-Length", "11000000")
        .body(())
        .unwrap();
    let rejection = check_http_request(&gateway, &oversized).expect_err("must short-circuit");
    assert_eq!(rejection.status(), http::StatusCode::PAYLOAD_TOO_LARGE);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_parallel_validations_are_all_metered() {
    // Input calls share the anonymous rate-limit bucket; lift the ceiling so
    // this test exercises the cache and metrics locks, not the limiter.
    let mut config = GatewayConfig::default();
    config.rate_limit.max_requests = 100_000;
    let gateway = Arc::new(gateway(config));
    let mut handles = Vec::new();

    for t in 0..8u32 {
        let gateway = Arc::clone(&gateway);
        handles.push(thread::spawn(move || {
            for i in 0..25u32 {
                let response =
                    gateway.validate_input(json!({"thread": t, "call": i, "name": "Ada"}), None);
                assert!(response.valid);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = gateway.metrics();
    assert_eq!(snapshot.total_validations, 200);
    assert_eq!(snapshot.successful_validations, 200);
    assert!(snapshot.cache_entries <= 200);
}

#[test]
fn test_racing_identical_requests_converge_on_one_entry() {
    let mut config = GatewayConfig::default();
    config.rate_limit.max_requests = 100_000;
    let gateway = Arc::new(gateway(config));
    let mut handles = Vec::new();

    // Both threads may compute and store the same result redundantly; the
    // cache must still end up with exactly one entry for the shape.
    for _ in 0..4 {
        let gateway = Arc::clone(&gateway);
        handles.push(thread::spawn(move || {
            for _ in 0..50 {
                gateway.validate_input(json!({"name": "Ada"}), None);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(gateway.metrics().cache_entries, 1);
    assert_eq!(gateway.metrics().total_validations, 200);
}

// ============================================================================
// Budget and Cancellation
// ============================================================================

#[test]
fn test_exhausted_budget_is_a_structured_rejection() {
    let gateway = gateway(GatewayConfig::default());
    let request = ValidationRequest::new(
        PayloadKind::Input,
        Payload::Json(json!({"name": "Ada"})),
    )
    .with_timeout(Duration::ZERO);

    let response = gateway.validate(request);
    assert!(!response.valid);
    assert!(response.result.has_code(codes::VALIDATION_TIMEOUT));
    assert_eq!(gateway.metrics().cache_entries, 0);
}
