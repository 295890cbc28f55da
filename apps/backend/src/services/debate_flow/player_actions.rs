use time::OffsetDateTime;
use tracing::{debug, info};

use super::{DebateFlowService, SubmitOutcome};
use crate::domain::ids::{ParticipantId, SessionId};
use crate::domain::phase::Phase;
use crate::domain::session::Submission;
use crate::domain::submissions::required_submitters;
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::repos::session_store::InsertOutcome;

impl DebateFlowService {
    /// Record a human participant's statement for the current phase.
    ///
    /// `expected_phase` is the phase the client was looking at; if the
    /// session has moved on the call is a no-op. A duplicate submission is a
    /// no-op success. An accepted submission that completes the phase
    /// triggers the transition.
    pub async fn submit(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
        content: &str,
        expected_phase: Option<Phase>,
    ) -> Result<SubmitOutcome, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(
                DomainError::validation(ValidationKind::EmptyContent, "Statement is empty").into(),
            );
        }

        // Validation data is read here, never taken from the caller.
        let state = self.store.load_state(session_id).await?;
        if expected_phase.is_some_and(|p| p != state.phase) {
            debug!(
                session_id = %session_id,
                participant_id = %participant_id,
                current = %state.phase,
                "Submission for a closed phase"
            );
            return Ok(SubmitOutcome::PhaseClosed {
                current: state.phase,
            });
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
                "Automated statements are produced by the dispatcher",
            )
            .into());
        }
        if !required_submitters(state.phase, &roster).contains(participant_id) {
            return Err(DomainError::validation(
                ValidationKind::NotRequiredSubmitter,
                format!("{participant_id} does not submit in phase {}", state.phase),
            )
            .into());
        }

        let submission = Submission::new(
            session_id.clone(),
            participant_id.clone(),
            state.phase,
            content.to_string(),
            OffsetDateTime::now_utc(),
        );
        match self.store.insert_submission(submission).await? {
            InsertOutcome::AlreadyExists => {
                debug!(
                    session_id = %session_id,
                    participant_id = %participant_id,
                    phase = %state.phase,
                    "Duplicate submission ignored"
                );
                Ok(SubmitOutcome::AlreadySubmitted)
            }
            InsertOutcome::Inserted => {
                info!(
                    session_id = %session_id,
                    participant_id = %participant_id,
                    phase = %state.phase,
                    "Submission accepted"
                );
                let advance = self.advance_if_complete(session_id, state.phase).await?;
                Ok(SubmitOutcome::Accepted { advance })
            }
        }
    }
}
