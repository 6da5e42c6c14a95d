//! Form submission checker.

use serde_json::Value;

use palisade_config::CsrfConfig;

use crate::check::{check_field_heuristics, Checked, PayloadChecker};
use crate::sanitize;
use crate::types::{codes, Payload, PayloadKind, ValidationResult, Violation};

/// Checker for form submissions.
///
/// Sanitizes form fields (redacting sensitive ones), verifies presence of
/// required fields, validates the anti-forgery token's shape, and runs the
/// same per-field heuristics as the input checker. The token shape is checked
/// against the submitted value, not the redacted copy: redaction is for the
/// echoed payload only.
pub struct FormChecker {
    sanitize_enabled: bool,
    required_fields: Vec<String>,
    csrf: CsrfConfig,
}

impl FormChecker {
    pub fn new(sanitize_enabled: bool, required_fields: Vec<String>, csrf: CsrfConfig) -> Self {
        Self {
            sanitize_enabled,
            required_fields,
            csrf,
        }
    }
}

impl PayloadChecker for FormChecker {
    fn check(&self, payload: &Payload, _schema: Option<&Value>) -> Checked {
        let Payload::Json(value) = payload else {
            return Checked::kind_mismatch(PayloadKind::Form);
        };

        let mut result = ValidationResult::ok();
        let sanitized = self.sanitize_enabled.then(|| sanitize::sanitize(value));

        let Some(fields) = value.as_object() else {
            result.push(Violation::error(
                codes::MISSING_REQUIRED_FIELD,
                "Form payload must be a field map",
                "",
            ));
            return Checked { result, sanitized };
        };

        for required in &self.required_fields {
            if !fields.contains_key(required) {
                result.push(Violation::error(
                    codes::MISSING_REQUIRED_FIELD,
                    format!("Required field '{required}' is missing"),
                    required.clone(),
                ));
            }
        }

        for (field, value) in fields {
            if self.csrf.enabled && field == &self.csrf.token_field {
                if let Value::String(token) = value {
                    if token.chars().count() < self.csrf.min_token_len {
                        result.push(Violation::error(
                            codes::INVALID_CSRF_TOKEN,
                            "Invalid CSRF token",
                            field.clone(),
                        ));
                    }
                }
            }
            check_field_heuristics(field, value, &mut result);
        }

        Checked { result, sanitized }
    }
}
