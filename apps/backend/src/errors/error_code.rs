//! Error codes for the debate backend API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings that
//! appear in HTTP responses.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request Validation
    /// Participant or session identity missing from the request
    MissingIdentity,
    /// Role must be pro or con
    InvalidRole,
    /// Unknown phase name
    InvalidPhase,
    /// Participant is not a required submitter for the current phase
    NotRequiredSubmitter,
    /// Automated participants cannot perform human actions
    AutomatedParticipant,
    /// Statement content must not be empty
    EmptyContent,
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,

    // Resource Not Found
    /// Session not found
    SessionNotFound,
    /// Participant not found in session roster
    ParticipantNotFound,
    /// General not found error
    NotFound,

    // Conditional-write conflicts
    /// Phase already advanced past the expected phase
    PhaseAdvanced,
    /// Optimistic lock conflict
    OptimisticLock,
    /// Submission already exists for this phase
    AlreadySubmitted,
    /// Dispatch already claimed by another observer
    AlreadyClaimed,
    /// Participant already picked a role
    AlreadyPicked,
    /// Generic conflict (fallback for unmatched conflicts)
    Conflict,

    // Generator
    /// Automated-response generator timed out
    GeneratorTimeout,
    /// Automated-response generator unreachable
    GeneratorUnavailable,
    /// Automated-response generator returned unusable output
    GeneratorMalformed,

    // System Errors
    /// Database error
    DbError,
    /// Database unavailable
    DbUnavailable,
    /// Database timeout (gateway timeout)
    DbTimeout,
    /// Unique constraint violation (SQLSTATE 23505)
    UniqueViolation,
    /// Record not found (generic 404 for DB-driven not-found)
    RecordNotFound,
    /// Internal server error
    Internal,
    /// Configuration error
    ConfigError,
    /// Data corruption detected
    DataCorruption,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingIdentity => "MISSING_IDENTITY",
            Self::InvalidRole => "INVALID_ROLE",
            Self::InvalidPhase => "INVALID_PHASE",
            Self::NotRequiredSubmitter => "NOT_REQUIRED_SUBMITTER",
            Self::AutomatedParticipant => "AUTOMATED_PARTICIPANT",
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",

            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::ParticipantNotFound => "PARTICIPANT_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::PhaseAdvanced => "PHASE_ADVANCED",
            Self::OptimisticLock => "OPTIMISTIC_LOCK",
            Self::AlreadySubmitted => "ALREADY_SUBMITTED",
            Self::AlreadyClaimed => "ALREADY_CLAIMED",
            Self::AlreadyPicked => "ALREADY_PICKED",
            Self::Conflict => "CONFLICT",

            Self::GeneratorTimeout => "GENERATOR_TIMEOUT",
            Self::GeneratorUnavailable => "GENERATOR_UNAVAILABLE",
            Self::GeneratorMalformed => "GENERATOR_MALFORMED",

            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DbTimeout => "DB_TIMEOUT",
            Self::UniqueViolation => "UNIQUE_VIOLATION",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
            Self::DataCorruption => "DATA_CORRUPTION",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
