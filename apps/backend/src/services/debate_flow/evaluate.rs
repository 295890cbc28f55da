use tracing::{debug, warn};

use super::{
    AdvanceOutcome, DebateFlowService, DispatchOutcome, JudgingOutcome, RoleOutcome, StartOutcome,
};
use crate::domain::ids::{ParticipantId, SessionId};
use crate::domain::phase::Phase;
use crate::domain::role_conflict::distinct_picks;
use crate::domain::roster::elect_leader;
use crate::domain::session::SessionState;
use crate::error::AppError;
use crate::errors::domain::DomainError;

/// What one observer evaluation did, plus the state it ended on.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub state: SessionState,
    pub advanced: bool,
    pub dispatched: Vec<DispatchOutcome>,
}

impl DebateFlowService {
    /// One observer tick for `observer`: fresh read, then whichever of
    /// session start, role finalization, completeness, automated dispatch or
    /// judging applies to the current phase.
    ///
    /// Generator failures are logged and left for the next tick; store
    /// failures propagate.
    pub async fn evaluate(
        &self,
        session_id: &SessionId,
        observer: &ParticipantId,
    ) -> Result<Evaluation, AppError> {
        let state = self.store.load_state(session_id).await?;
        let roster = self.store.load_roster(session_id).await?;
        let is_leader = elect_leader(&roster) == Some(observer);
        let mut advanced = false;
        let mut dispatched = Vec::new();

        match state.phase {
            Phase::Forming if is_leader => {
                advanced = matches!(
                    self.start_session(session_id).await?,
                    StartOutcome::Started(_)
                );
            }
            Phase::RoleSelection if distinct_picks(&state).is_some() => {
                advanced = self.finalize_with_distinct_roles(session_id).await?
                    == RoleOutcome::Started;
            }
            phase if phase.is_main_sequence() => {
                advanced = self.advance_when_complete(session_id, phase).await?
                    != AdvanceOutcome::Noop;
                if !advanced {
                    dispatched = self.dispatch_automated_turns(session_id, observer).await?;
                    advanced = dispatched.iter().any(|d| {
                        matches!(d, DispatchOutcome::Produced { advance } if advance.advanced())
                    });
                }
            }
            Phase::Judging if is_leader => match self.judge_inner(session_id).await {
                Ok(outcome) => advanced = outcome == JudgingOutcome::Concluded,
                Err(DomainError::External(kind, detail)) => {
                    warn!(session_id = %session_id, kind = ?kind, detail = %detail, "Judging deferred");
                }
                Err(e) => return Err(e.into()),
            },
            phase => {
                debug!(session_id = %session_id, phase = %phase, "Nothing to evaluate");
            }
        }

        let state = if advanced || !dispatched.is_empty() {
            self.store.load_state(session_id).await?
        } else {
            state
        };
        Ok(Evaluation {
            state,
            advanced,
            dispatched,
        })
    }
}
