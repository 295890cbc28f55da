#![allow(dead_code)]

// tests/common/mod.rs
use actix_web::body::BoxBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::HeaderName;
use serde_json::Value;

pub mod proptest_prelude;

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// The `x-trace-id` header of a response, asserting it is present and non-empty.
pub fn trace_header(resp: &ServiceResponse<BoxBody>) -> String {
    let trace_hdr = HeaderName::from_static("x-trace-id");
    let trace_id = resp
        .headers()
        .get(&trace_hdr)
        .and_then(|v| v.to_str().ok())
        .expect("x-trace-id header should be present and valid UTF-8")
        .to_string();
    assert!(!trace_id.is_empty(), "x-trace-id header should not be empty");
    trace_id
}

/// Parse a JSON response body, asserting success status first.
pub async fn ok_json(resp: ServiceResponse<BoxBody>) -> Value {
    assert!(
        resp.status().is_success(),
        "expected success, got {}",
        resp.status()
    );
    let body = actix_web::test::read_body(resp).await;
    serde_json::from_slice(&body).expect("response body should be JSON")
}
