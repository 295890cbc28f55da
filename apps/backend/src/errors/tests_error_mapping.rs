// Unit tests for error mapping - pure domain logic without HTTP or database dependencies
use actix_web::body::to_bytes;
use actix_web::ResponseError;

use crate::errors::domain::{
    ConflictKind, DomainError, ExternalKind, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::errors::ErrorCode;
use crate::AppError;

#[test]
fn maps_validation_to_422() {
    let de = DomainError::validation(ValidationKind::InvalidRole, "role must be pro or con");
    let app: AppError = de.into();
    assert_eq!(app.code(), ErrorCode::InvalidRole);
    assert_eq!(app.status().as_u16(), 422);

    let other = DomainError::validation(ValidationKind::Other("X".into()), "bad field");
    let app: AppError = other.into();
    assert_eq!(app.code(), ErrorCode::ValidationError);
}

#[test]
fn maps_conflicts() {
    let advanced = DomainError::conflict(ConflictKind::PhaseAdvanced, "moved on");
    let app: AppError = advanced.into();
    assert_eq!(app.code().as_str(), "PHASE_ADVANCED");
    assert_eq!(app.status().as_u16(), 409);

    let other = DomainError::conflict(ConflictKind::Other("x".into()), "generic conflict");
    let app: AppError = other.into();
    assert_eq!(app.code().as_str(), "CONFLICT");
}

#[test]
fn maps_not_found() {
    let nf = DomainError::not_found(NotFoundKind::Session, "no session");
    let app: AppError = nf.into();
    assert_eq!(app.code().as_str(), "SESSION_NOT_FOUND");
    assert_eq!(app.status().as_u16(), 404);
}

#[test]
fn maps_infra() {
    let t = DomainError::infra(InfraErrorKind::Timeout, "timeout");
    let app: AppError = t.into();
    assert_eq!(app.code().as_str(), "DB_TIMEOUT");
    assert_eq!(app.status().as_u16(), 504);
    assert!(matches!(app, AppError::Timeout { .. }));

    let down = DomainError::infra(InfraErrorKind::DbUnavailable, "down");
    let app: AppError = down.into();
    assert_eq!(app.code().as_str(), "DB_UNAVAILABLE");
    assert_eq!(app.status().as_u16(), 503);
}

#[test]
fn maps_external_generator_failures() {
    let t = DomainError::external(ExternalKind::Timeout, "slow");
    let app: AppError = t.into();
    assert_eq!(app.code(), ErrorCode::GeneratorTimeout);
    assert_eq!(app.status().as_u16(), 504);

    let bad = DomainError::external(ExternalKind::Malformed, "not json");
    let app: AppError = bad.into();
    assert_eq!(app.code(), ErrorCode::GeneratorMalformed);
    assert_eq!(app.status().as_u16(), 502);
}

#[actix_web::test]
async fn problem_details_body_carries_code() {
    let app: AppError = DomainError::not_found(NotFoundKind::Session, "missing").into();
    let resp = app.error_response();
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    assert!(resp.headers().contains_key("x-trace-id"));
    let body = to_bytes(resp.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "SESSION_NOT_FOUND");
    assert_eq!(json["title"], "Session Not Found");
    assert_eq!(json["status"], 404);
}
