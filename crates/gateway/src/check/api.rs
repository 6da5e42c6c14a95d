//! Wire-level API request checker.

use serde_json::Value;
use tracing::trace;

use palisade_config::{ApiValidationConfig, CsrfConfig};

use crate::check::{Checked, PayloadChecker};
use crate::types::{codes, ApiRequest, Payload, PayloadKind, ValidationResult, Violation};

/// Checker for wire-level API request descriptors.
///
/// All checks run and accumulate violations — no early return — so a single
/// response reports every reason for rejection.
pub struct ApiChecker {
    config: ApiValidationConfig,
    csrf: CsrfConfig,
}

impl ApiChecker {
    pub fn new(config: ApiValidationConfig, csrf: CsrfConfig) -> Self {
        Self { config, csrf }
    }

    fn origin_allowed(&self, request: &ApiRequest) -> bool {
        // An empty allow-list means no origin restriction
        if self.csrf.allowed_origins.is_empty() {
            return true;
        }
        let origin = request.header("origin");
        let referer = request.header("referer");
        self.csrf.allowed_origins.iter().any(|allowed| {
            origin == Some(allowed.as_str())
                || referer.is_some_and(|r| r.starts_with(allowed.as_str()))
        })
    }
}

impl PayloadChecker for ApiChecker {
    fn check(&self, payload: &Payload, _schema: Option<&Value>) -> Checked {
        let Payload::Api(request) = payload else {
            return Checked::kind_mismatch(PayloadKind::Api);
        };

        let mut result = ValidationResult::ok();

        if let Some(length) = request.content_length {
            if length > self.config.max_request_bytes {
                result.push(Violation::error(
                    codes::REQUEST_TOO_LARGE,
                    format!(
                        "Declared size {} exceeds maximum {}",
                        length, self.config.max_request_bytes
                    ),
                    "content-length",
                ));
            }
        }

        if let Some(content_type) = request.content_type() {
            let allowed = self
                .config
                .allowed_content_types
                .iter()
                .any(|a| content_type.contains(a.as_str()));
            if !allowed {
                result.push(Violation::error(
                    codes::INVALID_CONTENT_TYPE,
                    format!("Content type '{content_type}' is not allowed"),
                    "content-type",
                ));
            }
        }

        for header in &self.config.required_headers {
            if request.header(header).is_none() {
                result.push(Violation::error(
                    codes::MISSING_REQUIRED_HEADER,
                    format!("Required header '{header}' is missing"),
                    header.clone(),
                ));
            }
        }

        if self.csrf.enabled && !self.origin_allowed(request) {
            result.push(Violation::error(
                codes::INVALID_ORIGIN,
                "Request origin is not allowed",
                "origin",
            ));
        }

        trace!(
            method = %request.method,
            path = %request.path,
            valid = result.valid,
            violations = result.violations.len(),
            "API request checked"
        );

        Checked {
            result,
            sanitized: None,
        }
    }
}
