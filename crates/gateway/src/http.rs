//! Sans-I/O HTTP boundary adapter.
//!
//! The gateway is a library consumed by an external HTTP layer; this module
//! is the one place it touches wire types. [`ApiRequest::from_http`] snapshots
//! the parts of an inbound `http` request the API checker inspects, and
//! [`check_http_request`] short-circuits an invalid cycle with a structured
//! JSON rejection instead of letting it reach downstream handling.

use bytes::Bytes;
use http::{header, Request, Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use tracing::debug;

use palisade_common::RequestId;

use crate::gateway::Gateway;
use crate::types::{ApiRequest, ValidationResponse, ValidationResult};

impl ApiRequest {
    /// Build a descriptor from the parts of an inbound `http` request.
    ///
    /// Headers with non-UTF-8 values are skipped; the declared size is taken
    /// from `Content-Length` when it parses. The peer address is not part of
    /// `http::Request` — attach it with [`ApiRequest::with_remote_addr`] if
    /// the transport knows it.
    pub fn from_http<B>(request: &Request<B>) -> Self {
        let mut descriptor = ApiRequest::new(request.method().as_str(), request.uri().path());
        for (name, value) in request.headers() {
            if let Ok(value) = value.to_str() {
                descriptor = descriptor.with_header(name.as_str(), value);
            }
        }
        let content_length = request
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        if let Some(length) = content_length {
            descriptor = descriptor.with_content_length(length);
        }
        descriptor
    }
}

/// Structured body of an HTTP rejection.
#[derive(Debug, Serialize)]
pub struct RejectionBody {
    /// Short description of the failure class
    pub error: String,
    /// HTTP status carried in the response line, repeated for body-only readers
    pub status: u16,
    /// Identifier of the rejected validation attempt
    pub request_id: RequestId,
    /// Full validation outcome, violations included
    pub result: ValidationResult,
}

/// Validate an inbound request/response cycle.
///
/// On a valid outcome the caller proceeds to downstream handling with the
/// returned [`ValidationResponse`]; on an invalid one the cycle is
/// short-circuited with the rejection to send.
pub fn check_http_request<B>(
    gateway: &Gateway,
    request: &Request<B>,
) -> Result<ValidationResponse, Response<Full<Bytes>>> {
    let response = gateway.validate_api_request(ApiRequest::from_http(request));
    if response.valid {
        return Ok(response);
    }
    debug!(
        request_id = %response.request_id,
        violations = response.result.violations.len(),
        "Short-circuiting invalid HTTP request"
    );
    Err(rejection_response(&response))
}

/// Render an invalid validation outcome as a structured HTTP rejection.
pub fn rejection_response(response: &ValidationResponse) -> Response<Full<Bytes>> {
    let status = response.result.http_status();
    let body = RejectionBody {
        error: "Validation failed".to_string(),
        status,
        request_id: response.request_id,
        result: response.result.clone(),
    };
    let body = serde_json::to_vec(&body)
        .unwrap_or_else(|_| br#"{"error":"Validation failed","status":400}"#.to_vec());

    Response::builder()
        .status(StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST))
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-request-id", response.request_id.to_string())
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::new()))
                .unwrap()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::codes;
    use palisade_config::GatewayConfig;

    fn gateway() -> Gateway {
        Gateway::new(GatewayConfig::default()).expect("default config is valid")
    }

    fn http_request() -> Request<()> {
        Request::builder()
            .method("POST")
            .uri("https://example.com/api/items?page=2")
            .header("User-Agent", "integration-test/1.0")
            .header("Content-Type", "application/json")
            .header("Content-Length", "42")
            .body(())
            .unwrap()
    }

    #[test]
    fn test_from_http_snapshots_request_parts() {
        let descriptor = ApiRequest::from_http(&http_request());
        assert_eq!(descriptor.method, "POST");
        assert_eq!(descriptor.path, "/api/items");
        assert_eq!(descriptor.content_length, Some(42));
        assert_eq!(descriptor.header("user-agent"), Some("integration-test/1.0"));
    }

    #[test]
    fn test_valid_request_proceeds() {
        let gateway = gateway();
        let validated = check_http_request(&gateway, &http_request());
        let response = validated.expect("well-formed request should pass");
        assert!(response.valid);
    }

    #[test]
    fn test_invalid_request_is_short_circuited() {
        let gateway = gateway();
        let request = Request::builder()
            .method("POST")
            .uri("/api/items")
            // no user-agent: fails the required-header check
            .header("Content-Type", "application/json")
            .body(())
            .unwrap();

        let rejection = check_http_request(&gateway, &request)
            .expect_err("request missing a required header must be rejected");
        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            rejection.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(rejection.headers().contains_key("x-request-id"));
    }

    #[test]
    fn test_rejection_status_tracks_violation_code() {
        let gateway = gateway();
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header("User-Agent", "t")
            .header("Content-Type", "application/json")
            .header("Content-Length", "11000000")
            .body(())
            .unwrap();

        let rejection = check_http_request(&gateway, &request).expect_err("oversized");
        assert_eq!(rejection.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_rejection_body_carries_the_result() {
        let response = ValidationResponse {
            request_id: RequestId::new(),
            valid: false,
            result: ValidationResult::rejected(codes::INVALID_ORIGIN, "bad origin", "origin"),
            sanitized: None,
            cached: false,
            duration: std::time::Duration::from_millis(1),
        };

        let body = RejectionBody {
            error: "Validation failed".to_string(),
            status: response.result.http_status(),
            request_id: response.request_id,
            result: response.result.clone(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], 403);
        assert_eq!(json["result"]["violations"][0]["code"], "invalid_origin");
        assert_eq!(
            json["request_id"],
            serde_json::to_value(response.request_id).unwrap()
        );

        let rejection = rejection_response(&response);
        assert_eq!(rejection.status(), StatusCode::FORBIDDEN);
    }
}
