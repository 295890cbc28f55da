//! Automated-response generator module.
//!
//! This module provides:
//! - the generator trait used by the dispatcher, topic provisioning and judging
//! - OpenAiResponder: chat-completions client
//! - ScriptedResponder: deterministic generator (seedable for tests)
//! - prompt construction and request payloads

pub mod config;
mod openai;
pub mod prompts;
pub mod request;
mod scripted;
mod trait_def;

use std::sync::Arc;

pub use config::GeneratorConfig;
pub use openai::OpenAiResponder;
pub use request::{HistoryEntry, JudgmentDraft, JudgmentRequest, StatementRequest};
pub use scripted::ScriptedResponder;
pub use trait_def::{AiError, AutomatedResponder};

/// Pick a generator for the given configuration.
///
/// - API key present: OpenAiResponder
/// - otherwise: ScriptedResponder with system entropy
pub fn create_responder(config: &GeneratorConfig) -> Arc<dyn AutomatedResponder> {
    match &config.api_key {
        Some(key) => Arc::new(OpenAiResponder::new(key.clone(), config.clone())),
        None => Arc::new(ScriptedResponder::new(None)),
    }
}
