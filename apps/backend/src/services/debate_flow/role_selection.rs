use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::{absorb_conflict, DebateFlowService, RoleOutcome};
use crate::domain::ids::{ParticipantId, SessionId};
use crate::domain::phase::Phase;
use crate::domain::role_conflict::{
    assignments_from_picks, distinct_picks, random_assignments, resolve_pick, RoleResolution,
};
use crate::domain::roster::{automated, humans, Participant, Role, RoleAssignment};
use crate::domain::session::SessionState;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::repos::session_store::{StateGuard, StateUpdate};

/// Re-reads allowed when a pick loses a version race.
const PICK_ATTEMPTS: usize = 8;

fn automated_ids(roster: &[Participant]) -> Vec<ParticipantId> {
    automated(roster).into_iter().map(|p| p.id.clone()).collect()
}

fn incomplete_roster() -> DomainError {
    DomainError::validation(
        ValidationKind::Other("ROSTER_INCOMPLETE".into()),
        "Two human and two automated participants are required",
    )
}

impl DebateFlowService {
    /// Record a human participant's role pick and resolve it.
    ///
    /// Each attempt decides from a fresh read and writes under the exact
    /// record version; a lost race re-reads and decides again.
    pub async fn select_role(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
        role: Role,
    ) -> Result<RoleOutcome, AppError> {
        for _ in 0..PICK_ATTEMPTS {
            let state = self.store.load_state(session_id).await?;
            match state.phase {
                Phase::Forming => {
                    return Err(DomainError::validation(
                        ValidationKind::InvalidPhase,
                        "Role selection has not started",
                    )
                    .into())
                }
                Phase::RoleSelection => {}
                _ => return Ok(RoleOutcome::Noop),
            }

            let roster = self.store.load_roster(session_id).await?;
            let participant = roster
                .iter()
                .find(|p| &p.id == participant_id)
                .ok_or_else(|| {
                    DomainError::not_found(
                        NotFoundKind::Participant,
                        format!("Participant {participant_id} not in session {session_id}"),
                    )
                })?;
            if participant.is_automated {
                return Err(DomainError::validation(
                    ValidationKind::AutomatedParticipant,
                    "Automated participants do not pick roles",
                )
                .into());
            }

            let resolution =
                resolve_pick(&state, participant_id, role, self.config.role_conflict_bound);
            debug!(
                session_id = %session_id,
                participant_id = %participant_id,
                role = %role,
                resolution = ?resolution,
                "Role pick evaluated"
            );
            let guard = StateGuard::exact(&state);
            let outcome = match resolution {
                RoleResolution::AlreadyPicked(_) => Some(RoleOutcome::Waiting),
                RoleResolution::Waiting => {
                    let pick = Some(participant_id.clone());
                    let update = match role {
                        Role::Pro => StateUpdate::new().with_pro_pick(pick),
                        Role::Con => StateUpdate::new().with_con_pick(pick),
                    };
                    absorb_conflict(self.store.update_state_if(session_id, &guard, update).await)?
                        .map(|_| RoleOutcome::Waiting)
                }
                RoleResolution::Finalize { pro, con } => {
                    let assignments = assignments_from_picks(&pro, &con, &automated_ids(&roster));
                    self.finalize(session_id, &guard, &assignments)
                        .await?
                        .then_some(RoleOutcome::Started)
                }
                RoleResolution::RetryWithNewTopic {
                    next_conflict_count,
                } => self
                    .reset_topic(session_id, &state, &guard, next_conflict_count)
                    .await?,
                RoleResolution::RandomAssign => {
                    let assignments = self.random_roles(&roster)?;
                    self.finalize(session_id, &guard, &assignments)
                        .await?
                        .then_some(RoleOutcome::StartedRandom)
                }
            };
            if let Some(outcome) = outcome {
                return Ok(outcome);
            }
            debug!(session_id = %session_id, participant_id = %participant_id, "Role pick lost race, re-reading");
        }

        warn!(session_id = %session_id, participant_id = %participant_id, "Role pick kept losing races");
        Err(DomainError::conflict(
            ConflictKind::OptimisticLock,
            "Session state kept changing during role pick",
        )
        .into())
    }

    /// Finalize teams from two distinct picks. No-op outside role selection.
    pub async fn finalize_with_distinct_roles(
        &self,
        session_id: &SessionId,
    ) -> Result<RoleOutcome, AppError> {
        let state = self.store.load_state(session_id).await?;
        if state.phase != Phase::RoleSelection {
            return Ok(RoleOutcome::Noop);
        }
        let Some((pro, con)) = distinct_picks(&state) else {
            return Ok(RoleOutcome::Waiting);
        };
        let roster = self.store.load_roster(session_id).await?;
        let assignments = assignments_from_picks(&pro, &con, &automated_ids(&roster));
        let done = self
            .finalize(session_id, &StateGuard::phase(Phase::RoleSelection), &assignments)
            .await?;
        Ok(if done {
            RoleOutcome::Started
        } else {
            RoleOutcome::Noop
        })
    }

    /// New topic and cleared picks, guarded on the caller's conflict count.
    ///
    /// A `current_conflict_count` at or past the bound assigns roles randomly
    /// instead, whether or not a same-role conflict is pending; with no picks
    /// recorded this still starts the debate.
    pub async fn retry_with_new_topic(
        &self,
        session_id: &SessionId,
        current_conflict_count: u32,
    ) -> Result<RoleOutcome, AppError> {
        if current_conflict_count >= self.config.role_conflict_bound {
            return self.assign_randomly(session_id).await;
        }
        let state = self.store.load_state(session_id).await?;
        if state.phase != Phase::RoleSelection {
            return Ok(RoleOutcome::Noop);
        }
        let guard =
            StateGuard::phase(Phase::RoleSelection).with_conflict_count(current_conflict_count);
        Ok(self
            .reset_topic(session_id, &state, &guard, current_conflict_count + 1)
            .await?
            .unwrap_or(RoleOutcome::Noop))
    }

    /// Random distinct roles for the humans. No-op outside role selection.
    pub async fn assign_randomly(&self, session_id: &SessionId) -> Result<RoleOutcome, AppError> {
        let state = self.store.load_state(session_id).await?;
        if state.phase != Phase::RoleSelection {
            return Ok(RoleOutcome::Noop);
        }
        let roster = self.store.load_roster(session_id).await?;
        let assignments = self.random_roles(&roster)?;
        let done = self
            .finalize(session_id, &StateGuard::phase(Phase::RoleSelection), &assignments)
            .await?;
        Ok(if done {
            RoleOutcome::StartedRandom
        } else {
            RoleOutcome::Noop
        })
    }

    fn random_roles(&self, roster: &[Participant]) -> Result<Vec<RoleAssignment>, DomainError> {
        let human_ids: Vec<ParticipantId> =
            humans(roster).into_iter().map(|p| p.id.clone()).collect();
        random_assignments(&human_ids, &automated_ids(roster), &mut *self.rng.lock())
            .ok_or_else(incomplete_roster)
    }

    /// Assign roles and enter the opening phase. `false` when the guard failed.
    async fn finalize(
        &self,
        session_id: &SessionId,
        guard: &StateGuard,
        assignments: &[RoleAssignment],
    ) -> Result<bool, DomainError> {
        if assignments.len() < 4 {
            return Err(incomplete_roster());
        }
        let update = StateUpdate::new()
            .enter_phase(Phase::OpeningClaim, OffsetDateTime::now_utc())
            .clear_picks();
        let written = absorb_conflict(
            self.store
                .finalize_roles(session_id, guard, update, assignments)
                .await,
        )?;
        if written.is_some() {
            info!(session_id = %session_id, assignments = ?assignments, "Roles finalized");
        }
        Ok(written.is_some())
    }

    /// Clear picks under a new topic. `None` when the guard failed.
    async fn reset_topic(
        &self,
        session_id: &SessionId,
        state: &SessionState,
        guard: &StateGuard,
        next_conflict_count: u32,
    ) -> Result<Option<RoleOutcome>, DomainError> {
        let topic = self.obtain_topic(state.topic.as_deref()).await;
        let update = StateUpdate::new()
            .with_topic(topic.clone())
            .with_conflict_count(next_conflict_count)
            .clear_picks();
        let written =
            absorb_conflict(self.store.update_state_if(session_id, guard, update).await)?;
        Ok(written.map(|_| {
            info!(
                session_id = %session_id,
                conflict_count = next_conflict_count,
                "Same-role conflict, topic reset"
            );
            RoleOutcome::Retry {
                topic,
                conflict_count: next_conflict_count,
            }
        }))
    }
}
