//! Generator configuration.
//!
//! Read from the environment at startup. A missing API key selects the
//! scripted generator, see [`crate::ai::create_responder`].

use std::env;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Sampling settings for one kind of call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub statement: Sampling,
    pub topic: Sampling,
    pub judge: Sampling,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            statement: Sampling {
                max_tokens: 500,
                temperature: 0.7,
            },
            topic: Sampling {
                max_tokens: 100,
                temperature: 1.0,
            },
            judge: Sampling {
                max_tokens: 1500,
                temperature: 0.3,
            },
        }
    }
}

impl GeneratorConfig {
    /// `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_BASE_URL`. Empty values count as unset.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            api_key: non_empty("OPENAI_API_KEY"),
            model: non_empty("OPENAI_MODEL").unwrap_or(defaults.model),
            base_url: non_empty("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            ..defaults
        }
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}
