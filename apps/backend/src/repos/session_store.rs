//! Store contract for debate sessions.
//!
//! The coordination record is only ever mutated through [`SessionStore::update_state_if`]
//! and [`SessionStore::finalize_roles`], both conditional on a [`StateGuard`].
//! Inserts of submissions, claims and judgments are insert-if-absent.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::ids::{ParticipantId, SessionId};
use crate::domain::phase::Phase;
use crate::domain::roster::{Participant, RoleAssignment};
use crate::domain::session::{deadline_for, Judgment, Session, SessionState, Submission};
use crate::errors::domain::DomainError;
use crate::repos::change_feed::ChangeEvent;

/// Predicate a conditional write must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateGuard {
    pub phase: Phase,
    pub version: Option<i32>,
    pub topic_conflict_count: Option<u32>,
}

impl StateGuard {
    /// Guard on the phase alone.
    pub fn phase(phase: Phase) -> Self {
        Self {
            phase,
            version: None,
            topic_conflict_count: None,
        }
    }

    /// Guard on the phase and the exact record version.
    pub fn exact(state: &SessionState) -> Self {
        Self {
            phase: state.phase,
            version: Some(state.version),
            topic_conflict_count: None,
        }
    }

    pub fn with_conflict_count(mut self, count: u32) -> Self {
        self.topic_conflict_count = Some(count);
        self
    }

    pub fn matches(&self, state: &SessionState) -> bool {
        state.phase == self.phase
            && self.version.is_none_or(|v| v == state.version)
            && self
                .topic_conflict_count
                .is_none_or(|c| c == state.topic_conflict_count)
    }
}

/// Columns to change in a conditional write. `None` leaves a column as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    /// New phase together with its entry time and deadline.
    pub enter_phase: Option<(Phase, OffsetDateTime)>,
    pub topic: Option<String>,
    pub topic_conflict_count: Option<u32>,
    /// Three-state: None = no change, Some(None) = clear.
    pub pro_pick: Option<Option<ParticipantId>>,
    pub con_pick: Option<Option<ParticipantId>>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_phase(mut self, phase: Phase, now: OffsetDateTime) -> Self {
        self.enter_phase = Some((phase, now));
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_conflict_count(mut self, count: u32) -> Self {
        self.topic_conflict_count = Some(count);
        self
    }

    pub fn with_pro_pick(mut self, pick: Option<ParticipantId>) -> Self {
        self.pro_pick = Some(pick);
        self
    }

    pub fn with_con_pick(mut self, pick: Option<ParticipantId>) -> Self {
        self.con_pick = Some(pick);
        self
    }

    pub fn clear_picks(self) -> Self {
        self.with_pro_pick(None).with_con_pick(None)
    }

    /// Apply to an in-memory record, bumping the version.
    pub fn apply(&self, state: &mut SessionState) {
        if let Some((phase, now)) = self.enter_phase {
            state.phase = phase;
            state.phase_entered_at = now;
            state.timer_deadline = deadline_for(phase, now);
        }
        if let Some(topic) = &self.topic {
            state.topic = Some(topic.clone());
        }
        if let Some(count) = self.topic_conflict_count {
            state.topic_conflict_count = count;
        }
        if let Some(pick) = &self.pro_pick {
            state.pro_pick = pick.clone();
        }
        if let Some(pick) = &self.con_pick {
            state.con_pick = pick.clone();
        }
        state.version += 1;
    }
}

/// What a dispatch claim reserves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClaimTarget {
    Participant(ParticipantId),
    Judgment,
}

impl ClaimTarget {
    pub fn key(&self) -> String {
        match self {
            ClaimTarget::Participant(id) => format!("participant:{id}"),
            ClaimTarget::Judgment => "judgment".to_string(),
        }
    }
}

/// One outstanding external generation, unique per (session, phase, target).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DispatchClaim {
    pub session_id: SessionId,
    pub phase: Phase,
    pub target: ClaimTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

impl InsertOutcome {
    pub fn inserted(self) -> bool {
        self == InsertOutcome::Inserted
    }
}

/// Full read of one session, used for rendering and observer evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session: Session,
    pub state: SessionState,
    pub roster: Vec<Participant>,
    pub submissions: Vec<Submission>,
    pub judgment: Option<Judgment>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session in `forming` with an empty roster.
    async fn create_session(&self, name: &str) -> Result<Session, DomainError>;

    async fn load_session(&self, session_id: &SessionId) -> Result<Session, DomainError>;

    async fn load_state(&self, session_id: &SessionId) -> Result<SessionState, DomainError>;

    async fn load_roster(&self, session_id: &SessionId) -> Result<Vec<Participant>, DomainError>;

    /// Submissions in creation order.
    async fn load_submissions(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Submission>, DomainError>;

    async fn load_judgment(&self, session_id: &SessionId)
        -> Result<Option<Judgment>, DomainError>;

    /// Insert-if-absent keyed on participant id.
    async fn add_participant(&self, participant: Participant)
        -> Result<InsertOutcome, DomainError>;

    /// Apply `update` only if `guard` holds. Returns the new record, or a
    /// `Conflict` when the predicate fails.
    async fn update_state_if(
        &self,
        session_id: &SessionId,
        guard: &StateGuard,
        update: StateUpdate,
    ) -> Result<SessionState, DomainError>;

    /// Conditional state write plus roster role/team assignment, atomically.
    async fn finalize_roles(
        &self,
        session_id: &SessionId,
        guard: &StateGuard,
        update: StateUpdate,
        assignments: &[RoleAssignment],
    ) -> Result<SessionState, DomainError>;

    /// Insert-if-absent keyed on (session, participant, phase).
    async fn insert_submission(&self, submission: Submission)
        -> Result<InsertOutcome, DomainError>;

    async fn claim_dispatch(&self, claim: &DispatchClaim) -> Result<InsertOutcome, DomainError>;

    async fn release_dispatch(&self, claim: &DispatchClaim) -> Result<(), DomainError>;

    /// Delete `claim` only if it was taken before `stale_before`. Returns
    /// whether a row was removed, so one caller wins a takeover.
    async fn reclaim_stale_dispatch(
        &self,
        claim: &DispatchClaim,
        stale_before: OffsetDateTime,
    ) -> Result<bool, DomainError>;

    /// Insert-if-absent keyed on session.
    async fn insert_judgment(&self, judgment: Judgment) -> Result<InsertOutcome, DomainError>;

    /// Change notifications for one session.
    fn subscribe(&self, session_id: &SessionId) -> BoxStream<'static, ChangeEvent>;

    async fn load_snapshot(&self, session_id: &SessionId) -> Result<SessionSnapshot, DomainError> {
        let session = self.load_session(session_id).await?;
        let state = self.load_state(session_id).await?;
        let roster = self.load_roster(session_id).await?;
        let submissions = self.load_submissions(session_id).await?;
        let judgment = self.load_judgment(session_id).await?;
        Ok(SessionSnapshot {
            session,
            state,
            roster,
            submissions,
            judgment,
        })
    }
}
