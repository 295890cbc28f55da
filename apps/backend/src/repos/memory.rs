//! In-process `SessionStore` with the same conditional-write semantics as
//! the Postgres adapter. Backs tests and `DEBATE_STORE=memory` deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::BoxStream;
use parking_lot::Mutex;
use time::OffsetDateTime;

use crate::domain::ids::SessionId;
use crate::domain::roster::{Participant, RoleAssignment};
use crate::domain::session::{Judgment, Session, SessionState, SessionStatus, Submission};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::repos::change_feed::{ChangeEvent, ChangeFeed};
use crate::repos::session_store::{
    DispatchClaim, InsertOutcome, SessionStore, StateGuard, StateUpdate,
};

#[derive(Default)]
struct Tables {
    sessions: HashMap<SessionId, Session>,
    states: HashMap<SessionId, SessionState>,
    roster: HashMap<SessionId, Vec<Participant>>,
    submissions: HashMap<SessionId, Vec<Submission>>,
    claims: HashMap<DispatchClaim, OffsetDateTime>,
    judgments: HashMap<SessionId, Judgment>,
}

#[derive(Default)]
pub struct InMemorySessionStore {
    tables: Mutex<Tables>,
    feed: ChangeFeed,
}

fn session_not_found(session_id: &SessionId) -> DomainError {
    DomainError::not_found(
        NotFoundKind::Session,
        format!("Session {session_id} not found"),
    )
}

fn guard_conflict(guard: &StateGuard, current: &SessionState) -> DomainError {
    if current.phase != guard.phase {
        DomainError::conflict(
            ConflictKind::PhaseAdvanced,
            format!("expected phase {}, found {}", guard.phase, current.phase),
        )
    } else {
        DomainError::conflict(
            ConflictKind::OptimisticLock,
            format!(
                "record changed concurrently (version {}, conflict count {})",
                current.version, current.topic_conflict_count
            ),
        )
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_state(
        tables: &mut Tables,
        session_id: &SessionId,
        guard: &StateGuard,
        update: &StateUpdate,
    ) -> Result<SessionState, DomainError> {
        let state = tables
            .states
            .get_mut(session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        if !guard.matches(state) {
            return Err(guard_conflict(guard, state));
        }
        update.apply(state);
        let updated = state.clone();
        if let Some(session) = tables.sessions.get_mut(session_id) {
            session.status = SessionStatus::for_phase(updated.phase);
        }
        Ok(updated)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, name: &str) -> Result<Session, DomainError> {
        let now = OffsetDateTime::now_utc();
        let session = Session {
            id: SessionId::generate(),
            name: name.to_string(),
            status: SessionStatus::Forming,
            created_at: now,
        };
        let mut tables = self.tables.lock();
        tables
            .states
            .insert(session.id.clone(), SessionState::initial(session.id.clone(), now));
        tables.roster.insert(session.id.clone(), Vec::new());
        tables.submissions.insert(session.id.clone(), Vec::new());
        tables.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn load_session(&self, session_id: &SessionId) -> Result<Session, DomainError> {
        self.tables
            .lock()
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| session_not_found(session_id))
    }

    async fn load_state(&self, session_id: &SessionId) -> Result<SessionState, DomainError> {
        self.tables
            .lock()
            .states
            .get(session_id)
            .cloned()
            .ok_or_else(|| session_not_found(session_id))
    }

    async fn load_roster(&self, session_id: &SessionId) -> Result<Vec<Participant>, DomainError> {
        let tables = self.tables.lock();
        let mut roster = tables
            .roster
            .get(session_id)
            .cloned()
            .ok_or_else(|| session_not_found(session_id))?;
        roster.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(roster)
    }

    async fn load_submissions(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Submission>, DomainError> {
        self.tables
            .lock()
            .submissions
            .get(session_id)
            .cloned()
            .ok_or_else(|| session_not_found(session_id))
    }

    async fn load_judgment(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<Judgment>, DomainError> {
        Ok(self.tables.lock().judgments.get(session_id).cloned())
    }

    async fn add_participant(
        &self,
        participant: Participant,
    ) -> Result<InsertOutcome, DomainError> {
        let session_id = participant.session_id.clone();
        let outcome = {
            let mut tables = self.tables.lock();
            let roster = tables
                .roster
                .get_mut(&session_id)
                .ok_or_else(|| session_not_found(&session_id))?;
            if roster.iter().any(|p| p.id == participant.id) {
                InsertOutcome::AlreadyExists
            } else {
                roster.push(participant);
                InsertOutcome::Inserted
            }
        };
        if outcome.inserted() {
            self.feed.publish(ChangeEvent::RosterChanged { session_id });
        }
        Ok(outcome)
    }

    async fn update_state_if(
        &self,
        session_id: &SessionId,
        guard: &StateGuard,
        update: StateUpdate,
    ) -> Result<SessionState, DomainError> {
        let updated = {
            let mut tables = self.tables.lock();
            Self::write_state(&mut tables, session_id, guard, &update)?
        };
        self.feed.publish(ChangeEvent::StateChanged {
            session_id: session_id.clone(),
            version: updated.version,
        });
        Ok(updated)
    }

    async fn finalize_roles(
        &self,
        session_id: &SessionId,
        guard: &StateGuard,
        update: StateUpdate,
        assignments: &[RoleAssignment],
    ) -> Result<SessionState, DomainError> {
        let updated = {
            let mut tables = self.tables.lock();
            let roster = tables
                .roster
                .get(session_id)
                .ok_or_else(|| session_not_found(session_id))?;
            if let Some(missing) = assignments
                .iter()
                .find(|a| !roster.iter().any(|p| p.id == a.participant_id))
            {
                return Err(DomainError::not_found(
                    NotFoundKind::Participant,
                    format!("Participant {} not in session", missing.participant_id),
                ));
            }
            let updated = Self::write_state(&mut tables, session_id, guard, &update)?;
            if let Some(roster) = tables.roster.get_mut(session_id) {
                for assignment in assignments {
                    if let Some(p) = roster
                        .iter_mut()
                        .find(|p| p.id == assignment.participant_id)
                    {
                        p.role = Some(assignment.role);
                        p.team = Some(assignment.team);
                    }
                }
            }
            updated
        };
        self.feed.publish(ChangeEvent::RosterChanged {
            session_id: session_id.clone(),
        });
        self.feed.publish(ChangeEvent::StateChanged {
            session_id: session_id.clone(),
            version: updated.version,
        });
        Ok(updated)
    }

    async fn insert_submission(
        &self,
        submission: Submission,
    ) -> Result<InsertOutcome, DomainError> {
        let session_id = submission.session_id.clone();
        let outcome = {
            let mut tables = self.tables.lock();
            let list = tables
                .submissions
                .get_mut(&session_id)
                .ok_or_else(|| session_not_found(&session_id))?;
            let duplicate = list.iter().any(|s| {
                s.participant_id == submission.participant_id && s.phase == submission.phase
            });
            if duplicate {
                InsertOutcome::AlreadyExists
            } else {
                list.push(submission);
                InsertOutcome::Inserted
            }
        };
        if outcome.inserted() {
            self.feed.publish(ChangeEvent::SubmissionAdded { session_id });
        }
        Ok(outcome)
    }

    async fn claim_dispatch(&self, claim: &DispatchClaim) -> Result<InsertOutcome, DomainError> {
        let mut tables = self.tables.lock();
        if !tables.sessions.contains_key(&claim.session_id) {
            return Err(session_not_found(&claim.session_id));
        }
        if tables.claims.contains_key(claim) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        tables
            .claims
            .insert(claim.clone(), OffsetDateTime::now_utc());
        Ok(InsertOutcome::Inserted)
    }

    async fn release_dispatch(&self, claim: &DispatchClaim) -> Result<(), DomainError> {
        self.tables.lock().claims.remove(claim);
        Ok(())
    }

    async fn reclaim_stale_dispatch(
        &self,
        claim: &DispatchClaim,
        stale_before: OffsetDateTime,
    ) -> Result<bool, DomainError> {
        let mut tables = self.tables.lock();
        match tables.claims.get(claim) {
            Some(claimed_at) if *claimed_at < stale_before => {
                tables.claims.remove(claim);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_judgment(&self, judgment: Judgment) -> Result<InsertOutcome, DomainError> {
        let session_id = judgment.session_id.clone();
        let outcome = {
            let mut tables = self.tables.lock();
            if !tables.sessions.contains_key(&session_id) {
                return Err(session_not_found(&session_id));
            }
            if tables.judgments.contains_key(&session_id) {
                InsertOutcome::AlreadyExists
            } else {
                tables.judgments.insert(session_id.clone(), judgment);
                InsertOutcome::Inserted
            }
        };
        if outcome.inserted() {
            self.feed.publish(ChangeEvent::JudgmentRecorded { session_id });
        }
        Ok(outcome)
    }

    fn subscribe(&self, session_id: &SessionId) -> BoxStream<'static, ChangeEvent> {
        self.feed.subscribe(session_id)
    }
}
