use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::{absorb_conflict, DebateFlowService, JudgingOutcome, StartOutcome};
use crate::ai::{HistoryEntry, JudgmentRequest};
use crate::domain::ids::{ParticipantId, SessionId};
use crate::domain::phase::Phase;
use crate::domain::roster::{humans, Participant};
use crate::domain::session::{Judgment, Session};
use crate::domain::topics;
use crate::error::AppError;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::repos::session_store::{
    ClaimTarget, DispatchClaim, InsertOutcome, StateGuard, StateUpdate,
};

/// Human seats per session.
pub const HUMAN_SEATS: usize = 2;

/// Deterministic ids for the two automated participants of a session, so that
/// concurrent provisioning collapses onto the same rows.
pub fn automated_participant_ids(session_id: &SessionId) -> [ParticipantId; 2] {
    [
        ParticipantId::from(format!("{session_id}-auto-1")),
        ParticipantId::from(format!("{session_id}-auto-2")),
    ]
}

impl DebateFlowService {
    pub async fn create_session(&self, name: &str) -> Result<Session, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::Other("EMPTY_NAME".into()),
                "Session name is empty",
            )
            .into());
        }
        let session = self.store.create_session(name).await?;
        info!(session_id = %session.id, "Session created");
        Ok(session)
    }

    /// Add a human participant while the session is forming.
    pub async fn join_session(
        &self,
        session_id: &SessionId,
        display_name: &str,
    ) -> Result<Participant, AppError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::MissingIdentity,
                "Display name is required",
            )
            .into());
        }
        let state = self.store.load_state(session_id).await?;
        if state.phase != Phase::Forming {
            return Err(DomainError::validation(
                ValidationKind::InvalidPhase,
                format!("Session is in {}, joining is closed", state.phase),
            )
            .into());
        }
        let roster = self.store.load_roster(session_id).await?;
        if humans(&roster).len() >= HUMAN_SEATS {
            return Err(DomainError::validation(
                ValidationKind::Other("SESSION_FULL".into()),
                "Both seats are taken",
            )
            .into());
        }

        let participant = Participant {
            id: ParticipantId::generate(),
            session_id: session_id.clone(),
            display_name: display_name.to_string(),
            is_automated: false,
            role: None,
            team: None,
        };
        self.store.add_participant(participant.clone()).await?;
        info!(session_id = %session_id, participant_id = %participant.id, "Participant joined");
        Ok(participant)
    }

    /// Generator topic, or a static one when the generator fails or stalls.
    pub(super) async fn obtain_topic(&self, current: Option<&str>) -> String {
        match self.bounded(self.responder.generate_topic()).await {
            Ok(topic) if !topic.trim().is_empty() && Some(topic.as_str()) != current => topic,
            Ok(_) => {
                warn!("Generator returned an unusable topic, using fallback");
                topics::fresh_topic(current, &mut *self.rng.lock()).to_string()
            }
            Err(err) => {
                warn!(error = %err, "Topic generation failed, using fallback");
                topics::fresh_topic(current, &mut *self.rng.lock()).to_string()
            }
        }
    }

    /// `forming -> role_selection` once both humans are present.
    ///
    /// Provisions the automated participants (insert-if-absent), picks a
    /// topic, then performs the conditional transition.
    pub async fn start_session(&self, session_id: &SessionId) -> Result<StartOutcome, AppError> {
        let state = self.store.load_state(session_id).await?;
        if state.phase != Phase::Forming {
            return Ok(StartOutcome::Noop);
        }
        let roster = self.store.load_roster(session_id).await?;
        if humans(&roster).len() < HUMAN_SEATS {
            return Ok(StartOutcome::NotReady);
        }

        for (n, id) in automated_participant_ids(session_id).into_iter().enumerate() {
            let bot = Participant {
                id,
                session_id: session_id.clone(),
                display_name: format!("Automated Debater {}", n + 1),
                is_automated: true,
                role: None,
                team: None,
            };
            if self.store.add_participant(bot).await? == InsertOutcome::Inserted {
                debug!(session_id = %session_id, slot = n + 1, "Automated participant provisioned");
            }
        }

        let topic = self.obtain_topic(state.topic.as_deref()).await;
        let update = StateUpdate::new()
            .enter_phase(Phase::RoleSelection, OffsetDateTime::now_utc())
            .with_topic(topic)
            .with_conflict_count(0)
            .clear_picks();
        let written = absorb_conflict(
            self.store
                .update_state_if(session_id, &StateGuard::phase(Phase::Forming), update)
                .await,
        )?;
        Ok(match written {
            Some(state) => {
                info!(session_id = %session_id, topic = ?state.topic, "Session started");
                StartOutcome::Started(state)
            }
            None => StartOutcome::Noop,
        })
    }

    /// Produce the judgment once and conclude the session.
    pub async fn run_judging(&self, session_id: &SessionId) -> Result<JudgingOutcome, AppError> {
        Ok(self.judge_inner(session_id).await?)
    }

    pub(super) async fn judge_inner(&self, session_id: &SessionId) -> Result<JudgingOutcome, DomainError> {
        let state = self.store.load_state(session_id).await?;
        if state.phase != Phase::Judging {
            return Ok(JudgingOutcome::Noop);
        }

        if self.store.load_judgment(session_id).await?.is_none() {
            let claim = DispatchClaim {
                session_id: session_id.clone(),
                phase: Phase::Judging,
                target: ClaimTarget::Judgment,
            };
            if !self.acquire_claim(&claim).await? {
                debug!(session_id = %session_id, "Judgment claimed elsewhere");
                return Ok(JudgingOutcome::InFlight);
            }

            let roster = self.store.load_roster(session_id).await?;
            let submissions = self.store.load_submissions(session_id).await?;
            let request = JudgmentRequest {
                session_id: session_id.clone(),
                topic: state.topic.clone().unwrap_or_default(),
                history: HistoryEntry::attribute(&submissions, &roster),
                roster,
            };
            let draft = match self.bounded(self.responder.judge(&request)).await {
                Ok(draft) => draft,
                Err(err) => {
                    if let Err(release_err) = self.store.release_dispatch(&claim).await {
                        warn!(session_id = %session_id, error = %release_err, "Failed to release judgment claim");
                    }
                    return Err(err.into());
                }
            };

            let judgment = Judgment {
                session_id: session_id.clone(),
                verdict: draft.verdict,
                scores: draft.scores,
                overall_analysis: draft.overall_analysis,
                created_at: OffsetDateTime::now_utc(),
            };
            if self.store.insert_judgment(judgment).await?.inserted() {
                info!(session_id = %session_id, verdict = draft.verdict.as_str(), "Judgment recorded");
            }
        }

        let concluded = absorb_conflict(
            self.store
                .update_state_if(
                    session_id,
                    &StateGuard::phase(Phase::Judging),
                    StateUpdate::new().enter_phase(Phase::Concluded, OffsetDateTime::now_utc()),
                )
                .await,
        )?;
        if concluded.is_some() {
            info!(session_id = %session_id, "Session concluded");
        }
        Ok(JudgingOutcome::Concluded)
    }
}
