use std::sync::Arc;

use crate::adapters::session_store_sea::SeaSessionStore;
use crate::ai::{create_responder, AutomatedResponder, GeneratorConfig};
use crate::config::db::{DbOwner, DbProfile};
use crate::config::debate::DebateConfig;
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::repos::memory::InMemorySessionStore;
use crate::repos::session_store::SessionStore;
use crate::services::debate_flow::DebateFlowService;
use crate::state::app_state::AppState;

enum StoreChoice {
    Memory,
    Postgres(DbProfile),
    Provided(Arc<dyn SessionStore>),
}

/// Builder for [`AppState`] (used in both tests and main).
pub struct StateBuilder {
    store: StoreChoice,
    responder: Option<Arc<dyn AutomatedResponder>>,
    generator: GeneratorConfig,
    debate: DebateConfig,
    seed: Option<u64>,
    observers: bool,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            store: StoreChoice::Memory,
            responder: None,
            generator: GeneratorConfig::default(),
            debate: DebateConfig::default(),
            seed: None,
            observers: false,
        }
    }

    /// Postgres store; migrations run during `build`.
    pub fn with_db(mut self, profile: DbProfile) -> Self {
        self.store = StoreChoice::Postgres(profile);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = StoreChoice::Provided(store);
        self
    }

    pub fn with_responder(mut self, responder: Arc<dyn AutomatedResponder>) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn with_generator_config(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_debate_config(mut self, debate: DebateConfig) -> Self {
        self.debate = debate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Spawn a server-side observer per joined participant.
    pub fn with_observers(mut self, enabled: bool) -> Self {
        self.observers = enabled;
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let store: Arc<dyn SessionStore> = match self.store {
            StoreChoice::Memory => Arc::new(InMemorySessionStore::new()),
            StoreChoice::Postgres(profile) => {
                Arc::new(SeaSessionStore::new(bootstrap_db(profile, DbOwner::App).await?))
            }
            StoreChoice::Provided(store) => store,
        };
        let responder = self
            .responder
            .unwrap_or_else(|| create_responder(&self.generator));
        let mut flow = DebateFlowService::new(store, responder, self.debate);
        if let Some(seed) = self.seed {
            flow = flow.with_seed(seed);
        }
        let flow = Arc::new(flow);
        Ok(if self.observers {
            AppState::new(flow)
        } else {
            AppState::without_observers(flow)
        })
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
