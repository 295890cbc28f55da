//! Session records: the coordination record, submissions and the judgment.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::ids::{ParticipantId, SessionId};
use crate::domain::phase::Phase;
use crate::domain::roster::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Forming,
    Active,
    Concluded,
}

impl SessionStatus {
    /// Status implied by a phase. Stores write it alongside the phase.
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Forming => SessionStatus::Forming,
            Phase::Concluded => SessionStatus::Concluded,
            _ => SessionStatus::Active,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Forming => "forming",
            SessionStatus::Active => "active",
            SessionStatus::Concluded => "concluded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub status: SessionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The single mutable coordination record of a session.
///
/// Every write is conditional on `phase` (and optionally `version` or
/// `topic_conflict_count`); `version` increments on every successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: SessionId,
    pub phase: Phase,
    #[serde(with = "time::serde::rfc3339::option")]
    pub timer_deadline: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub phase_entered_at: OffsetDateTime,
    pub topic: Option<String>,
    pub topic_conflict_count: u32,
    pub pro_pick: Option<ParticipantId>,
    pub con_pick: Option<ParticipantId>,
    pub version: i32,
}

impl SessionState {
    pub fn initial(session_id: SessionId, now: OffsetDateTime) -> Self {
        Self {
            session_id,
            phase: Phase::Forming,
            timer_deadline: None,
            phase_entered_at: now,
            topic: None,
            topic_conflict_count: 0,
            pro_pick: None,
            con_pick: None,
            version: 1,
        }
    }

    pub fn pick_of(&self, role: Role) -> Option<&ParticipantId> {
        match role {
            Role::Pro => self.pro_pick.as_ref(),
            Role::Con => self.con_pick.as_ref(),
        }
    }

    /// Role a participant has picked, if any.
    pub fn picked_role(&self, participant: &ParticipantId) -> Option<Role> {
        if self.pro_pick.as_ref() == Some(participant) {
            Some(Role::Pro)
        } else if self.con_pick.as_ref() == Some(participant) {
            Some(Role::Con)
        } else {
            None
        }
    }
}

/// Deadline for a phase entered at `entered_at`.
pub fn deadline_for(phase: Phase, entered_at: OffsetDateTime) -> Option<OffsetDateTime> {
    phase.time_budget().map(|budget| entered_at + budget)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub session_id: SessionId,
    pub participant_id: ParticipantId,
    pub phase: Phase,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Submission {
    pub fn new(
        session_id: SessionId,
        participant_id: ParticipantId,
        phase: Phase,
        content: String,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            session_id,
            participant_id,
            phase,
            content,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pro,
    Con,
    Draw,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pro => "pro",
            Verdict::Con => "con",
            Verdict::Draw => "draw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantScore {
    pub participant_id: ParticipantId,
    pub score: u32,
    pub feedback: String,
}

/// Terminal artifact, written at most once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub session_id: SessionId,
    pub verdict: Verdict,
    pub scores: Vec<ParticipantScore>,
    pub overall_analysis: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
