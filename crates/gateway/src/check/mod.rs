//! Type-specific payload checkers.
//!
//! Three variants dispatched by payload kind, polymorphic over the
//! [`PayloadChecker`] capability. Checkers accumulate violations — no early
//! return — so a single response reports every reason for rejection.

mod api;
mod form;
mod input;

pub use api::ApiChecker;
pub use form::FormChecker;
pub use input::InputChecker;

use serde_json::Value;

use crate::types::{codes, PayloadKind, Payload, ValidationResult, Violation};

/// Outcome of one checker invocation: the structured result plus an optional
/// sanitized copy of the payload.
#[derive(Debug)]
pub struct Checked {
    /// The structured validation outcome
    pub result: ValidationResult,
    /// Sanitized copy of the payload, when sanitization ran
    pub sanitized: Option<Value>,
}

impl Checked {
    /// Outcome for a payload body that does not match the checker's kind.
    pub fn kind_mismatch(kind: PayloadKind) -> Self {
        Self {
            result: ValidationResult::rejected(
                codes::UNKNOWN_VALIDATION_TYPE,
                format!("unsupported payload for validation kind '{kind}'"),
                "",
            ),
            sanitized: None,
        }
    }
}

/// Capability shared by the three checkers.
pub trait PayloadChecker: Send + Sync {
    /// Validate a payload against an optional schema descriptor.
    fn check(&self, payload: &Payload, schema: Option<&Value>) -> Checked;
}

/// Field-level heuristics shared by the input and form checkers.
///
/// Declared-email fields must contain `@` and `.`; declared-phone fields must
/// be 10-15 characters. Non-string values for these fields pass through to
/// schema conformance.
pub(crate) fn check_field_heuristics(field: &str, value: &Value, result: &mut ValidationResult) {
    match field {
        "email" => {
            if let Value::String(s) = value {
                if !(s.contains('@') && s.contains('.')) {
                    result.push(Violation::error(
                        codes::INVALID_EMAIL,
                        "Invalid email format",
                        field,
                    ));
                }
            }
        }
        "phone" => {
            if let Value::String(s) = value {
                let len = s.chars().count();
                if !(10..=15).contains(&len) {
                    result.push(Violation::error(
                        codes::INVALID_PHONE,
                        "Invalid phone number format",
                        field,
                    ));
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_email_heuristic() {
        let mut result = ValidationResult::ok();
        check_field_heuristics("email", &json!("user@example.com"), &mut result);
        assert!(result.valid);

        check_field_heuristics("email", &json!("not-an-email"), &mut result);
        assert!(!result.valid);
        assert!(result.has_code(codes::INVALID_EMAIL));
    }

    #[test]
    fn test_phone_heuristic() {
        let mut result = ValidationResult::ok();
        check_field_heuristics("phone", &json!("0123456789"), &mut result);
        assert!(result.valid);

        check_field_heuristics("phone", &json!("12345"), &mut result);
        assert!(result.has_code(codes::INVALID_PHONE));
    }

    #[test]
    fn test_other_fields_have_no_heuristics() {
        let mut result = ValidationResult::ok();
        check_field_heuristics("nickname", &json!("x"), &mut result);
        assert!(result.valid);
        assert!(result.violations.is_empty());
    }
}
