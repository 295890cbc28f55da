use std::sync::Arc;

use crate::domain::ids::{ParticipantId, SessionId};
use crate::services::debate_flow::DebateFlowService;
use crate::services::observer::ObserverRegistry;

/// Shared handles for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<DebateFlowService>,
    observers: Option<Arc<ObserverRegistry>>,
}

impl AppState {
    /// State that runs a server-side observer for every joined participant.
    pub fn new(flow: Arc<DebateFlowService>) -> Self {
        Self {
            flow,
            observers: Some(Arc::new(ObserverRegistry::new())),
        }
    }

    /// State without observers; sessions move only through explicit calls.
    pub fn without_observers(flow: Arc<DebateFlowService>) -> Self {
        Self {
            flow,
            observers: None,
        }
    }

    pub fn observe(&self, session_id: &SessionId, participant_id: &ParticipantId) {
        if let Some(registry) = &self.observers {
            registry.ensure(&self.flow, session_id, participant_id);
        }
    }

    pub fn observers(&self) -> Option<&Arc<ObserverRegistry>> {
        self.observers.as_ref()
    }

    pub fn shutdown(&self) {
        if let Some(registry) = &self.observers {
            registry.shutdown();
        }
    }
}
