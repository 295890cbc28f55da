//! Domain layer: pure debate coordination types and rules.

pub mod ids;
pub mod phase;
pub mod role_conflict;
pub mod roster;
pub mod session;
pub mod session_transition;
pub mod submissions;
pub mod topics;

#[cfg(test)]
mod tests_props_tracker;

// Re-exports for ergonomics
pub use ids::{ParticipantId, SessionId};
pub use phase::{Phase, PhaseKind, StatementKind, SubmitterRule, PHASE_ORDER};
pub use role_conflict::RoleResolution;
pub use roster::{Participant, Role, RoleAssignment, RosterSlots, Team};
pub use session::{
    Judgment, ParticipantScore, Session, SessionState, SessionStatus, Submission, Verdict,
};
pub use session_transition::{derive_session_transitions, SessionTransition};
pub use submissions::{is_complete, required_submitters};
