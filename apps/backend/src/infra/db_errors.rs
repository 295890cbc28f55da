//! SeaORM -> DomainError translation helpers.
//!
//! Adapters convert `sea_orm::DbErr` into `crate::errors::domain::DomainError`
//! here, and higher layers map `DomainError` to `AppError` via `From`.

use tracing::{error, warn};

use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::logging::Redacted;
use crate::trace_ctx;

/// Prefix for adapter-raised conditional-write failures.
pub const PHASE_ADVANCED_PREFIX: &str = "PHASE_ADVANCED:";
/// Prefix for version/conflict-count guard failures, followed by a JSON payload.
pub const OPTIMISTIC_LOCK_PREFIX: &str = "OPTIMISTIC_LOCK:";

fn mentions_sqlstate(msg: &str, code: &str) -> bool {
    msg.contains(code) || msg.contains(&format!("SQLSTATE({code})"))
}

/// Map PostgreSQL constraint names to domain-specific conflict errors.
fn map_constraint_to_conflict(error_msg: &str) -> Option<(ConflictKind, &'static str)> {
    if error_msg.contains("ux_submissions_session_participant_phase") {
        return Some((
            ConflictKind::AlreadySubmitted,
            "Submission already exists for this phase",
        ));
    }
    if error_msg.contains("ux_dispatch_claims_session_phase_target") {
        return Some((ConflictKind::AlreadyClaimed, "Dispatch already claimed"));
    }
    if error_msg.contains("ux_judgments_session") {
        return Some((
            ConflictKind::Other("JudgmentExists".into()),
            "Judgment already recorded",
        ));
    }
    None
}

/// Translate a `DbErr` into a `DomainError` with sanitized detail.
pub fn map_db_err(e: sea_orm::DbErr) -> DomainError {
    let error_msg = e.to_string();
    let trace_id = trace_ctx::trace_id();

    match &e {
        sea_orm::DbErr::RecordNotFound(_) => {
            return DomainError::not_found(
                NotFoundKind::Other("Record".into()),
                "Record not found",
            );
        }
        sea_orm::DbErr::Custom(msg) if msg.starts_with("SESSION_NOT_FOUND:") => {
            let session_id = msg.trim_start_matches("SESSION_NOT_FOUND:");
            warn!(trace_id = %trace_id, session_id, "Session not found");
            return DomainError::not_found(
                NotFoundKind::Session,
                format!("Session {session_id} not found"),
            );
        }
        sea_orm::DbErr::Custom(msg) if msg.starts_with(PHASE_ADVANCED_PREFIX) => {
            let detail = msg.trim_start_matches(PHASE_ADVANCED_PREFIX);
            return DomainError::conflict(ConflictKind::PhaseAdvanced, detail.to_string());
        }
        sea_orm::DbErr::Custom(msg) if msg.starts_with(OPTIMISTIC_LOCK_PREFIX) => {
            #[derive(serde::Deserialize)]
            struct LockInfo {
                expected: i32,
                actual: i32,
            }

            let json_str = msg.trim_start_matches(OPTIMISTIC_LOCK_PREFIX);
            if let Ok(info) = serde_json::from_str::<LockInfo>(json_str) {
                warn!(
                    trace_id = %trace_id,
                    expected = info.expected,
                    actual = info.actual,
                    "Optimistic lock conflict detected"
                );
                return DomainError::conflict(
                    ConflictKind::OptimisticLock,
                    format!(
                        "Session state was modified concurrently (expected version {}, actual version {})",
                        info.expected, info.actual
                    ),
                );
            }
            return DomainError::conflict(
                ConflictKind::OptimisticLock,
                "Session state was modified concurrently",
            );
        }
        sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
            warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Database unavailable");
            return DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable");
        }
        _ => {}
    }

    if mentions_sqlstate(&error_msg, "23505")
        || error_msg.contains("duplicate key value violates unique constraint")
    {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Unique constraint violation");

        if let Some((kind, detail)) = map_constraint_to_conflict(&error_msg) {
            return DomainError::conflict(kind, detail);
        }

        return DomainError::conflict(
            ConflictKind::Other("Unique".into()),
            "Unique constraint violation",
        );
    }

    if mentions_sqlstate(&error_msg, "23503") {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Foreign key constraint violation");
        return DomainError::validation(
            ValidationKind::Other("FK_VIOLATION".into()),
            "Foreign key constraint violation",
        );
    }

    if error_msg.contains("timeout") || error_msg.contains("pool timed out") {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Database timeout or pool issue");
        return DomainError::infra(InfraErrorKind::Timeout, "Database timeout");
    }

    error!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Unhandled database error");
    DomainError::infra(
        InfraErrorKind::Other("DbErr".into()),
        "Database operation failed",
    )
}
