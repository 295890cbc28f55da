use time::OffsetDateTime;
use tracing::{debug, info};

use super::{absorb_conflict, AdvanceOutcome, DebateFlowService};
use crate::domain::ids::SessionId;
use crate::domain::phase::Phase;
use crate::domain::submissions::is_complete;
use crate::error::AppError;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::repos::session_store::{StateGuard, StateUpdate};

impl DebateFlowService {
    /// Move `session_id` from `expected` to its successor, exactly once.
    ///
    /// Only main-sequence phases advance through here; forming, role
    /// selection and judging leave through their own operations. Losing
    /// callers get [`AdvanceOutcome::Noop`] and must re-read rather than retry.
    pub async fn try_advance(
        &self,
        session_id: &SessionId,
        expected: Phase,
    ) -> Result<AdvanceOutcome, AppError> {
        Ok(self.advance_from(session_id, expected).await?)
    }

    /// Re-read roster and submissions and advance `phase` if it is complete.
    pub async fn advance_if_complete(
        &self,
        session_id: &SessionId,
        phase: Phase,
    ) -> Result<AdvanceOutcome, AppError> {
        Ok(self.advance_when_complete(session_id, phase).await?)
    }

    pub(super) async fn advance_from(
        &self,
        session_id: &SessionId,
        expected: Phase,
    ) -> Result<AdvanceOutcome, DomainError> {
        let Some(next) = expected.successor() else {
            return Ok(AdvanceOutcome::Noop);
        };
        if !expected.is_main_sequence() {
            return Err(DomainError::validation(
                ValidationKind::InvalidPhase,
                format!("phase {expected} does not advance on completion or timeout"),
            ));
        }

        let written = absorb_conflict(
            self.store
                .update_state_if(
                    session_id,
                    &StateGuard::phase(expected),
                    StateUpdate::new().enter_phase(next, OffsetDateTime::now_utc()),
                )
                .await,
        )?;

        match written {
            Some(state) => {
                info!(
                    session_id = %session_id,
                    from = %expected,
                    to = %state.phase,
                    version = state.version,
                    "Phase advanced"
                );
                Ok(AdvanceOutcome::Advanced(state))
            }
            None => {
                debug!(session_id = %session_id, expected = %expected, "Advance lost race");
                Ok(AdvanceOutcome::Noop)
            }
        }
    }

    pub(super) async fn advance_when_complete(
        &self,
        session_id: &SessionId,
        phase: Phase,
    ) -> Result<AdvanceOutcome, DomainError> {
        let state = self.store.load_state(session_id).await?;
        if state.phase != phase {
            return Ok(AdvanceOutcome::Noop);
        }
        let roster = self.store.load_roster(session_id).await?;
        let submissions = self.store.load_submissions(session_id).await?;
        if !is_complete(phase, &roster, &submissions) {
            debug!(session_id = %session_id, phase = %phase, "Phase not complete");
            return Ok(AdvanceOutcome::Noop);
        }
        self.advance_from(session_id, phase).await
    }
}
