//! Automated-response generator trait definition.

use std::fmt;

use async_trait::async_trait;

use crate::ai::request::{JudgmentDraft, JudgmentRequest, StatementRequest};
use crate::errors::domain::{DomainError, ExternalKind};

/// Errors that can occur while talking to a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    /// Generator did not answer within the configured bound
    Timeout,
    /// Generator unreachable or returned a non-success status
    Unavailable(String),
    /// Generator answered with unusable output
    Malformed(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::Timeout => write!(f, "generator timeout"),
            AiError::Unavailable(msg) => write!(f, "generator unavailable: {msg}"),
            AiError::Malformed(msg) => write!(f, "generator output malformed: {msg}"),
        }
    }
}

impl std::error::Error for AiError {}

impl From<AiError> for DomainError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::Timeout => DomainError::external(ExternalKind::Timeout, "generator timeout"),
            AiError::Unavailable(msg) => DomainError::external(ExternalKind::Unavailable, msg),
            AiError::Malformed(msg) => DomainError::external(ExternalKind::Malformed, msg),
        }
    }
}

/// Produces statements, topics and verdicts for a debate.
///
/// Implementations must not retry internally; callers bound each call with
/// a timeout and decide what a failure means.
#[async_trait]
pub trait AutomatedResponder: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Statement for the automated participant named in `request.target`.
    async fn generate_statement(&self, request: &StatementRequest) -> Result<String, AiError>;

    /// A fresh, clearly two-sided debate topic.
    async fn generate_topic(&self) -> Result<String, AiError>;

    /// Verdict over the full debate.
    async fn judge(&self, request: &JudgmentRequest) -> Result<JudgmentDraft, AiError>;
}
