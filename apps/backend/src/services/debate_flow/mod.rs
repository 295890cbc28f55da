//! Debate flow service - drives sessions through the phase graph on top of a
//! [`SessionStore`].
//!
//! Every decision is taken from a fresh read and every write is conditional,
//! so any number of observers may call into the same session concurrently.
//! Lost races surface as no-op outcomes, never as errors.

mod ai_coordinator;
mod evaluate;
mod lifecycle;
mod outcome;
mod player_actions;
mod role_selection;
mod transition;

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ai::AutomatedResponder;
use crate::config::debate::DebateConfig;
use crate::errors::domain::DomainError;
use crate::repos::session_store::SessionStore;

pub use evaluate::Evaluation;
pub use lifecycle::automated_participant_ids;
pub use outcome::{
    AdvanceOutcome, DispatchOutcome, JudgingOutcome, RoleOutcome, StartOutcome, SubmitOutcome,
};

pub struct DebateFlowService {
    store: Arc<dyn SessionStore>,
    responder: Arc<dyn AutomatedResponder>,
    config: DebateConfig,
    rng: Mutex<StdRng>,
}

impl DebateFlowService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        responder: Arc<dyn AutomatedResponder>,
        config: DebateConfig,
    ) -> Self {
        Self {
            store,
            responder,
            config,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible fallback topics and random role assignment.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    pub fn responder_name(&self) -> &'static str {
        self.responder.name()
    }
}

/// `Ok(None)` when the store rejected a conditional write.
pub(crate) fn absorb_conflict<T>(result: Result<T, DomainError>) -> Result<Option<T>, DomainError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_conflict() => Ok(None),
        Err(e) => Err(e),
    }
}
