//! Core data model for the validation gateway.
//!
//! A [`ValidationRequest`] is created once per inbound call, is immutable after
//! construction, and is owned by the calling stack — nothing here is shared
//! across validations. Checkers and interceptors produce a
//! [`ValidationResult`]; the orchestrator wraps it with delivery metadata into
//! a [`ValidationResponse`].

use palisade_common::{CancelToken, ClientId, RequestId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use xxhash_rust::xxh3::xxh3_64;

/// Violation codes surfaced by the gateway.
///
/// Every rejection is reported through one of these codes on a [`Violation`];
/// the gateway never exposes panics or `Err` returns for routine rejections.
pub mod codes {
    /// Client exceeded its request budget for the current window
    pub const RATE_LIMIT_EXCEEDED: &str = "rate_limit_exceeded";
    /// Payload kind and payload body do not match any supported checker
    pub const UNKNOWN_VALIDATION_TYPE: &str = "unknown_validation_type";
    /// A before-hook aborted the pipeline
    pub const INTERCEPTOR_ERROR: &str = "interceptor_error";
    /// The call exceeded its processing budget
    pub const VALIDATION_TIMEOUT: &str = "validation_timeout";
    /// The caller cancelled the call mid-flight
    pub const VALIDATION_CANCELLED: &str = "validation_cancelled";
    /// Declared-email field without `@` and `.`
    pub const INVALID_EMAIL: &str = "invalid_email";
    /// Declared-phone field outside 10-15 characters
    pub const INVALID_PHONE: &str = "invalid_phone";
    /// Anti-forgery token fails the shape check
    pub const INVALID_CSRF_TOKEN: &str = "invalid_csrf_token";
    /// Declared payload size above the configured ceiling
    pub const REQUEST_TOO_LARGE: &str = "request_too_large";
    /// Content type outside the allow-list
    pub const INVALID_CONTENT_TYPE: &str = "invalid_content_type";
    /// A required header is absent
    pub const MISSING_REQUIRED_HEADER: &str = "missing_required_header";
    /// Origin/referer outside the configured allow-list
    pub const INVALID_ORIGIN: &str = "invalid_origin";
    /// A required form field is absent
    pub const MISSING_REQUIRED_FIELD: &str = "missing_required_field";
    /// Schema conformance failure reported by the schema engine
    pub const SCHEMA_VIOLATION: &str = "schema_violation";
    /// The supplied schema itself does not compile
    pub const INVALID_SCHEMA: &str = "invalid_schema";

    /// Whether a rejection with this code can succeed on retry without
    /// changing the input. Only rate-limit rejections clear on their own
    /// (after the block window); everything else is structural.
    pub fn is_retryable(code: &str) -> bool {
        code == RATE_LIMIT_EXCEEDED
    }
}

/// Kind of payload being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// Free-form input payload
    Input,
    /// Wire-level API request descriptor
    Api,
    /// Form submission
    Form,
}

impl PayloadKind {
    /// Stable string form, used in metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Api => "api",
            Self::Form => "form",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw payload of a validation request.
///
/// Opaque to the orchestrator; type-specific checkers interpret it. Input and
/// form payloads are JSON values (the tagged union over scalars, sequences,
/// and string-keyed maps that the sanitizer descends); API payloads are
/// wire-level request descriptors.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A JSON document (scalar, sequence, or string-keyed map)
    Json(Value),
    /// A wire-level API request descriptor
    Api(ApiRequest),
}

impl Payload {
    /// Canonical JSON view of the payload, used for cache-key digests
    pub fn as_json(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Api(request) => serde_json::to_value(request).unwrap_or(Value::Null),
        }
    }
}

/// Wire-level API request descriptor.
///
/// An owned snapshot of the parts of an inbound request the API checker
/// inspects. Header names are stored lower-cased; the map is ordered so the
/// descriptor serializes canonically for cache-key digests.
#[derive(Debug, Clone, Serialize)]
pub struct ApiRequest {
    /// Request method
    pub method: String,
    /// Request path
    pub path: String,
    /// Lower-cased header map
    pub headers: BTreeMap<String, String>,
    /// Declared payload size, if a content-length was present
    pub content_length: Option<u64>,
    /// Peer address, when known
    pub remote_addr: Option<String>,
}

impl ApiRequest {
    /// Create a descriptor for the given method and path
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: BTreeMap::new(),
            content_length: None,
            remote_addr: None,
        }
    }

    /// Attach a header (name is lower-cased)
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Declare the payload size
    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    /// Record the peer address
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Look up a header by (case-insensitive) name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Declared content type, if any
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Derive the rate-limit client identity for this request.
    ///
    /// Prefers an explicit `x-client-id` header, then a digest of the user
    /// agent, then the remote address. Requests with none of these share the
    /// anonymous bucket.
    pub fn client_id(&self) -> ClientId {
        if let Some(id) = self.header("x-client-id") {
            return ClientId::new(id);
        }
        if let Some(ua) = self.header("user-agent") {
            return ClientId::new(format!("ua_{:x}", xxh3_64(ua.as_bytes())));
        }
        match &self.remote_addr {
            Some(addr) => ClientId::new(addr.clone()),
            None => ClientId::anonymous(),
        }
    }
}

/// Severity of a violation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational only
    Info,
    /// Suspicious but not rejecting
    Warning,
    /// Rejecting; flips the result invalid
    #[default]
    Error,
}

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Machine-readable code from [`codes`]
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Path of the offending field ("" when the violation is not field-scoped)
    pub field: String,
    /// Severity of this violation
    pub severity: Severity,
}

impl Violation {
    /// Create an error-severity violation
    pub fn error(code: &str, message: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: field.into(),
            severity: Severity::Error,
        }
    }

    /// Create a warning-severity violation
    pub fn warning(code: &str, message: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: field.into(),
            severity: Severity::Warning,
        }
    }
}

/// Outcome of one checker (or interceptor) invocation.
///
/// Invariant: `valid` is true exactly when no violation of `Error` severity
/// has been recorded. [`ValidationResult::push`] maintains this; an
/// interceptor overriding `valid` directly must do so explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Overall validity
    pub valid: bool,
    /// Enforcement level the check ran at
    pub level: Severity,
    /// Ordered field-level violations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    /// Unix-epoch milliseconds at which the result was produced
    pub timestamp_ms: u64,
    /// Free-form metadata attached by checkers or interceptors
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ValidationResult {
    /// A passing result with no violations
    pub fn ok() -> Self {
        Self {
            valid: true,
            level: Severity::Error,
            violations: Vec::new(),
            timestamp_ms: now_unix_ms(),
            metadata: Map::new(),
        }
    }

    /// An invalid result carrying a single error violation
    pub fn rejected(code: &str, message: impl Into<String>, field: impl Into<String>) -> Self {
        let mut result = Self::ok();
        result.push(Violation::error(code, message, field));
        result
    }

    /// Record a violation, flipping `valid` on error severity
    pub fn push(&mut self, violation: Violation) {
        if violation.severity >= Severity::Error {
            self.valid = false;
        }
        self.violations.push(violation);
    }

    /// Whether any violation carries the given code
    pub fn has_code(&self, code: &str) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }

    /// HTTP-equivalent status for this result.
    ///
    /// 200 for valid results; for rejections, the first violation with a
    /// dedicated status wins: 429 for rate limiting, 413 for oversized
    /// payloads, 403 for origin failures, 400 otherwise.
    pub fn http_status(&self) -> u16 {
        if self.valid {
            return 200;
        }
        if self.has_code(codes::RATE_LIMIT_EXCEEDED) {
            429
        } else if self.has_code(codes::REQUEST_TOO_LARGE) {
            413
        } else if self.has_code(codes::INVALID_ORIGIN) {
            403
        } else {
            400
        }
    }
}

/// One validation attempt, created per inbound call.
#[derive(Debug)]
pub struct ValidationRequest {
    /// Unique identifier, echoed back on the response
    pub id: RequestId,
    /// Payload kind, selects the checker
    pub kind: PayloadKind,
    /// The raw payload
    pub payload: Payload,
    /// Optional schema/shape descriptor for the payload
    pub schema: Option<Value>,
    /// Client identity for rate limiting
    pub client_id: ClientId,
    /// Caller-side asynchronous hint; does not change gateway execution
    pub asynchronous: bool,
    /// Processing budget for this call
    pub timeout: Duration,
    /// Priority hint
    pub priority: u8,
    /// Creation time, start of the budget clock
    pub created_at: Instant,
    /// Optional cooperative cancellation token
    pub cancel: Option<CancelToken>,
}

impl ValidationRequest {
    /// Create a request with gateway defaults for the remaining attributes
    pub fn new(kind: PayloadKind, payload: Payload) -> Self {
        Self {
            id: RequestId::new(),
            kind,
            payload,
            schema: None,
            client_id: ClientId::anonymous(),
            asynchronous: false,
            timeout: Duration::from_secs(5),
            priority: 1,
            created_at: Instant::now(),
            cancel: None,
        }
    }

    /// Attach a schema descriptor
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the client identity
    pub fn with_client(mut self, client_id: ClientId) -> Self {
        self.client_id = client_id;
        self
    }

    /// Override the processing budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the priority hint
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Mark the caller-side asynchronous hint
    pub fn with_async(mut self, asynchronous: bool) -> Self {
        self.asynchronous = asynchronous;
        self
    }

    /// Attach a cancellation token
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// A [`ValidationResult`] wrapped with delivery metadata.
///
/// Created once per orchestrator call; never mutated after return.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResponse {
    /// Identifier of the originating request
    pub request_id: RequestId,
    /// Copy of the result's validity for quick checks
    pub valid: bool,
    /// The checker/interceptor outcome
    pub result: ValidationResult,
    /// Sanitized copy of the payload, when sanitization ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitized: Option<Value>,
    /// Whether the result was served from the cache
    pub cached: bool,
    /// Total wall-clock processing time
    pub duration: Duration,
}

/// Current unix-epoch time in milliseconds
pub(crate) fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}
