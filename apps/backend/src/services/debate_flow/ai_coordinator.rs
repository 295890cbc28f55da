use std::future::Future;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::{DebateFlowService, DispatchOutcome};
use crate::ai::{AiError, HistoryEntry, StatementRequest};
use crate::domain::ids::{ParticipantId, SessionId};
use crate::domain::phase::Phase;
use crate::domain::roster::elect_leader;
use crate::domain::session::Submission;
use crate::domain::submissions::{has_submitted, required_automated, required_submitters};
use crate::error::AppError;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::repos::session_store::{ClaimTarget, DispatchClaim, InsertOutcome};

impl DebateFlowService {
    /// Run a generator call under the configured timeout.
    pub(super) async fn bounded<T, F>(&self, call: F) -> Result<T, AiError>
    where
        F: Future<Output = Result<T, AiError>>,
    {
        match tokio::time::timeout(self.config.generator_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AiError::Timeout),
        }
    }

    /// Take `claim`, taking over one whose holder has been silent for longer
    /// than the claim TTL.
    pub(super) async fn acquire_claim(&self, claim: &DispatchClaim) -> Result<bool, DomainError> {
        if self.store.claim_dispatch(claim).await?.inserted() {
            return Ok(true);
        }
        let stale_before = OffsetDateTime::now_utc() - self.config.claim_ttl;
        if !self.store.reclaim_stale_dispatch(claim, stale_before).await? {
            return Ok(false);
        }
        warn!(
            session_id = %claim.session_id,
            phase = %claim.phase,
            target = %claim.target.key(),
            "Reclaimed abandoned dispatch claim"
        );
        Ok(self.store.claim_dispatch(claim).await?.inserted())
    }

    /// Dispatch every outstanding automated turn of the current phase, if
    /// `observer` is the elected leader.
    ///
    /// Election only trims duplicate generator calls; the existence check and
    /// claim in [`Self::produce_automated_turn`] keep production exactly-once.
    pub async fn dispatch_automated_turns(
        &self,
        session_id: &SessionId,
        observer: &ParticipantId,
    ) -> Result<Vec<DispatchOutcome>, AppError> {
        let state = self.store.load_state(session_id).await?;
        let roster = self.store.load_roster(session_id).await?;
        if elect_leader(&roster) != Some(observer) {
            return Ok(Vec::new());
        }

        let submissions = self.store.load_submissions(session_id).await?;
        let pending: Vec<ParticipantId> = required_automated(state.phase, &roster)
            .into_iter()
            .filter(|id| !has_submitted(state.phase, id, &submissions))
            .collect();

        let mut outcomes = Vec::with_capacity(pending.len());
        for target in pending {
            let outcome = match self
                .produce_inner(session_id, state.phase, &target)
                .await
            {
                Ok(outcome) => outcome,
                Err(DomainError::External(kind, detail)) => {
                    warn!(
                        session_id = %session_id,
                        phase = %state.phase,
                        participant_id = %target,
                        kind = ?kind,
                        detail = %detail,
                        "Automated turn deferred"
                    );
                    DispatchOutcome::Deferred
                }
                Err(e) => return Err(e.into()),
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Produce the statement of automated participant `target` for `phase`.
    ///
    /// Safe to call from any number of places: it short-circuits when the
    /// statement exists, when another caller holds the claim, or when the
    /// phase has moved on. Generator failures release the claim and surface
    /// as a retryable error.
    pub async fn produce_automated_turn(
        &self,
        session_id: &SessionId,
        phase: Phase,
        target: &ParticipantId,
    ) -> Result<DispatchOutcome, AppError> {
        Ok(self.produce_inner(session_id, phase, target).await?)
    }

    async fn produce_inner(
        &self,
        session_id: &SessionId,
        phase: Phase,
        target: &ParticipantId,
    ) -> Result<DispatchOutcome, DomainError> {
        let state = self.store.load_state(session_id).await?;
        if state.phase != phase {
            return Ok(DispatchOutcome::PhaseClosed);
        }
        let roster = self.store.load_roster(session_id).await?;
        let is_automated = roster.iter().any(|p| &p.id == target && p.is_automated);
        if !is_automated || !required_submitters(phase, &roster).contains(target) {
            return Err(DomainError::validation(
                ValidationKind::NotRequiredSubmitter,
                format!("{target} is not an automated submitter of phase {phase}"),
            ));
        }

        let submissions = self.store.load_submissions(session_id).await?;
        if has_submitted(phase, target, &submissions) {
            debug!(session_id = %session_id, phase = %phase, participant_id = %target, "Automated turn already produced");
            return Ok(DispatchOutcome::AlreadyProduced);
        }

        let claim = DispatchClaim {
            session_id: session_id.clone(),
            phase,
            target: ClaimTarget::Participant(target.clone()),
        };
        if !self.acquire_claim(&claim).await? {
            debug!(session_id = %session_id, phase = %phase, participant_id = %target, "Automated turn claimed elsewhere");
            return Ok(DispatchOutcome::InFlight);
        }

        let request = StatementRequest {
            session_id: session_id.clone(),
            phase,
            topic: state.topic.clone().unwrap_or_default(),
            history: HistoryEntry::attribute(&submissions, &roster),
            roster,
            target: target.clone(),
        };
        let content = match self
            .bounded(self.responder.generate_statement(&request))
            .await
        {
            Ok(content) => content,
            Err(err) => {
                if let Err(release_err) = self.store.release_dispatch(&claim).await {
                    warn!(session_id = %session_id, error = %release_err, "Failed to release dispatch claim");
                }
                return Err(err.into());
            }
        };

        let submission = Submission::new(
            session_id.clone(),
            target.clone(),
            phase,
            content,
            OffsetDateTime::now_utc(),
        );
        if self.store.insert_submission(submission).await? == InsertOutcome::AlreadyExists {
            return Ok(DispatchOutcome::AlreadyProduced);
        }
        info!(
            session_id = %session_id,
            phase = %phase,
            participant_id = %target,
            generator = self.responder.name(),
            "Automated turn produced"
        );

        let advance = self.advance_when_complete(session_id, phase).await?;
        Ok(DispatchOutcome::Produced { advance })
    }
}
