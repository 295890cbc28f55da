use serde::Serialize;

use crate::domain::phase::Phase;
use crate::domain::session::SessionState;

/// Result of a transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// This caller won the conditional write.
    Advanced(SessionState),
    /// The phase had already moved on, or the phase is not ready.
    Noop,
}

impl AdvanceOutcome {
    pub fn advanced(&self) -> bool {
        matches!(self, AdvanceOutcome::Advanced(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdvanceOutcome::Advanced(_) => "advanced",
            AdvanceOutcome::Noop => "noop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { advance: AdvanceOutcome },
    /// An identical (session, participant, phase) submission already exists.
    AlreadySubmitted,
    /// The caller targeted a phase that is no longer current.
    PhaseClosed { current: Phase },
}

impl SubmitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitOutcome::Accepted { .. } => "accepted",
            SubmitOutcome::AlreadySubmitted => "already_submitted",
            SubmitOutcome::PhaseClosed { .. } => "phase_closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Produced { advance: AdvanceOutcome },
    AlreadyProduced,
    /// Another caller holds the claim for this turn.
    InFlight,
    PhaseClosed,
    /// Generator failed; the claim was released for the next tick.
    Deferred,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Produced { .. } => "produced",
            DispatchOutcome::AlreadyProduced => "already_produced",
            DispatchOutcome::InFlight => "in_flight",
            DispatchOutcome::PhaseClosed => "phase_closed",
            DispatchOutcome::Deferred => "deferred",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RoleOutcome {
    /// Awaiting the other participant's pick.
    Waiting,
    /// Distinct picks; roles finalized and the opening phase entered.
    Started,
    /// Same-role conflict: picks cleared and a new topic set.
    Retry { topic: String, conflict_count: u32 },
    /// Conflict bound reached; roles assigned randomly.
    StartedRandom,
    /// Role selection is not current.
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started(SessionState),
    /// Fewer than two human participants.
    NotReady,
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JudgingOutcome {
    Concluded,
    InFlight,
    Noop,
}
