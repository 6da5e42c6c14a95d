//! Free-form input payload checker.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use tracing::debug;

use crate::check::{check_field_heuristics, Checked, PayloadChecker};
use crate::sanitize;
use crate::types::{codes, Payload, PayloadKind, ValidationResult, Violation};

/// Checker for free-form input payloads.
///
/// Sanitizes first, then runs schema conformance when a schema is present,
/// then the per-field heuristics. Heuristic failures do not abort early; all
/// fields are checked and all violations collected.
pub struct InputChecker {
    sanitize_enabled: bool,
    strict_mode: bool,
}

impl InputChecker {
    pub fn new(sanitize_enabled: bool, strict_mode: bool) -> Self {
        Self {
            sanitize_enabled,
            strict_mode,
        }
    }
}

impl PayloadChecker for InputChecker {
    fn check(&self, payload: &Payload, schema: Option<&Value>) -> Checked {
        let Payload::Json(value) = payload else {
            return Checked::kind_mismatch(PayloadKind::Input);
        };

        let mut result = ValidationResult::ok();
        let sanitized = self.sanitize_enabled.then(|| sanitize::sanitize(value));
        let working = sanitized.as_ref().unwrap_or(value);

        if let Some(schema) = schema {
            check_schema_conformance(schema, working, &mut result);
        }

        if self.strict_mode {
            strict_mode_checks(working, &mut result);
        }

        if let Value::Object(fields) = working {
            for (field, value) in fields {
                check_field_heuristics(field, value, &mut result);
            }
        }

        Checked { result, sanitized }
    }
}

/// Delegate schema conformance to the schema engine, mapping each engine
/// error into a violation carrying the offending instance path.
fn check_schema_conformance(schema: &Value, instance: &Value, result: &mut ValidationResult) {
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema);

    match compiled {
        Ok(compiled) => {
            if let Err(errors) = compiled.validate(instance) {
                for error in errors {
                    let path = error.instance_path.to_string();
                    let field = if path.is_empty() { "$".to_string() } else { path };
                    result.push(Violation::error(
                        codes::SCHEMA_VIOLATION,
                        error.to_string(),
                        field,
                    ));
                }
            }
        }
        Err(err) => {
            debug!(error = %err, "Supplied schema does not compile");
            result.push(Violation::error(
                codes::INVALID_SCHEMA,
                format!("Schema does not compile: {err}"),
                "$",
            ));
        }
    }
}

/// Strict mode flags nulls and empty strings as warnings.
fn strict_mode_checks(value: &Value, result: &mut ValidationResult) {
    if has_null_values(value) {
        result.push(Violation::warning(
            codes::SCHEMA_VIOLATION,
            "Payload contains null values",
            "$",
        ));
    }
    if has_empty_strings(value) {
        result.push(Violation::warning(
            codes::SCHEMA_VIOLATION,
            "Payload contains empty strings",
            "$",
        ));
    }
}

fn has_null_values(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(has_null_values),
        Value::Object(map) => map.values().any(has_null_values),
        _ => false,
    }
}

fn has_empty_strings(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.iter().any(has_empty_strings),
        Value::Object(map) => map.values().any(has_empty_strings),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use serde_json::json;

    fn checker() -> InputChecker {
        InputChecker::new(true, false)
    }

    #[test]
    fn test_clean_payload_passes() {
        let checked = checker().check(&Payload::Json(json!({"name": "Ada"})), None);
        assert!(checked.result.valid);
        assert_eq!(checked.sanitized, Some(json!({"name": "Ada"})));
    }

    #[test]
    fn test_invalid_email_yields_single_violation() {
        let checked = checker().check(&Payload::Json(json!({"email": "not-an-email"})), None);
        assert!(!checked.result.valid);
        assert_eq!(checked.result.violations.len(), 1);
        let violation = &checked.result.violations[0];
        assert_eq!(violation.code, codes::INVALID_EMAIL);
        assert_eq!(violation.field, "email");
    }

    #[test]
    fn test_all_fields_checked_no_early_abort() {
        let checked = checker().check(
            &Payload::Json(json!({"email": "nope", "phone": "123"})),
            None,
        );
        assert!(!checked.result.valid);
        assert!(checked.result.has_code(codes::INVALID_EMAIL));
        assert!(checked.result.has_code(codes::INVALID_PHONE));
    }

    #[test]
    fn test_sanitization_runs_before_checks() {
        let checked = checker().check(
            &Payload::Json(json!({"bio": "<script>alert(1)</script>ok"})),
            None,
        );
        assert!(checked.result.valid);
        assert_eq!(checked.sanitized, Some(json!({"bio": "alert(1)ok"})));
    }

    #[test]
    fn test_sanitization_disabled_returns_no_copy() {
        let checker = InputChecker::new(false, false);
        let checked = checker.check(&Payload::Json(json!({"bio": "<b>x</b>"})), None);
        assert!(checked.sanitized.is_none());
    }

    #[test]
    fn test_schema_conformance_violations() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "minLength": 1},
                "age": {"type": "integer", "minimum": 0}
            },
            "required": ["name"]
        });

        let checked = checker().check(&Payload::Json(json!({"age": -3})), Some(&schema));
        assert!(!checked.result.valid);
        assert!(checked.result.has_code(codes::SCHEMA_VIOLATION));
        // both the missing field and the minimum are reported
        assert!(checked.result.violations.len() >= 2);
    }

    #[test]
    fn test_uncompilable_schema_is_reported() {
        let schema = json!({"type": "no-such-type"});
        let checked = checker().check(&Payload::Json(json!({})), Some(&schema));
        assert!(!checked.result.valid);
        assert!(checked.result.has_code(codes::INVALID_SCHEMA));
    }

    #[test]
    fn test_strict_mode_warns_on_nulls_and_empty_strings() {
        let checker = InputChecker::new(true, true);
        let checked = checker.check(&Payload::Json(json!({"a": null, "b": ""})), None);
        // warnings do not reject
        assert!(checked.result.valid);
        assert_eq!(checked.result.violations.len(), 2);
        assert!(checked
            .result
            .violations
            .iter()
            .all(|v| v.severity == Severity::Warning));
    }

    #[test]
    fn test_kind_mismatch_is_unknown_type() {
        let api = crate::types::ApiRequest::new("GET", "/");
        let checked = checker().check(&Payload::Api(api), None);
        assert!(!checked.result.valid);
        assert!(checked.result.has_code(codes::UNKNOWN_VALIDATION_TYPE));
    }
}
