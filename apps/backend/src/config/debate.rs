//! Coordination settings for debate sessions.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_ROLE_CONFLICT_BOUND: u32 = 2;
pub const DEFAULT_GENERATOR_TIMEOUT: Duration = Duration::from_secs(8);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// A dispatch claim older than this is treated as abandoned by its holder.
pub const DEFAULT_CLAIM_TTL: Duration = Duration::from_secs(32);

/// How an observer learns about changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObserverMode {
    /// Change-feed subscription, with the poll tick as a backstop.
    #[default]
    Stream,
    /// Poll tick only.
    Poll,
}

impl FromStr for ObserverMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stream" => Ok(ObserverMode::Stream),
            "poll" => Ok(ObserverMode::Poll),
            other => Err(AppError::config(format!(
                "DEBATE_OBSERVER_MODE must be 'stream' or 'poll', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebateConfig {
    /// Same-role conflicts tolerated before roles are assigned randomly.
    pub role_conflict_bound: u32,
    pub generator_timeout: Duration,
    pub poll_interval: Duration,
    pub observer_mode: ObserverMode,
    /// Age after which a claim may be taken over; keep it above the generator timeout.
    pub claim_ttl: Duration,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            role_conflict_bound: DEFAULT_ROLE_CONFLICT_BOUND,
            generator_timeout: DEFAULT_GENERATOR_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            observer_mode: ObserverMode::default(),
            claim_ttl: DEFAULT_CLAIM_TTL,
        }
    }
}

impl DebateConfig {
    pub fn with_role_conflict_bound(mut self, bound: u32) -> Self {
        self.role_conflict_bound = bound;
        self
    }

    pub fn with_generator_timeout(mut self, timeout: Duration) -> Self {
        self.generator_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_observer_mode(mut self, mode: ObserverMode) -> Self {
        self.observer_mode = mode;
        self
    }

    pub fn with_claim_ttl(mut self, ttl: Duration) -> Self {
        self.claim_ttl = ttl;
        self
    }

    /// Overlay `DEBATE_*` environment variables on the defaults.
    pub fn from_env() -> Result<Self, AppError> {
        let mut cfg = Self::default();
        if let Some(bound) = parse_var::<u32>("DEBATE_ROLE_CONFLICT_BOUND")? {
            cfg.role_conflict_bound = bound;
        }
        if let Some(ms) = parse_var::<u64>("DEBATE_GENERATOR_TIMEOUT_MS")? {
            cfg.generator_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>("DEBATE_POLL_INTERVAL_MS")? {
            if ms == 0 {
                return Err(AppError::config(
                    "DEBATE_POLL_INTERVAL_MS must be positive".to_string(),
                ));
            }
            cfg.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>("DEBATE_CLAIM_TTL_MS")? {
            cfg.claim_ttl = Duration::from_millis(ms);
        }
        if cfg.claim_ttl <= cfg.generator_timeout {
            return Err(AppError::config(
                "DEBATE_CLAIM_TTL_MS must exceed the generator timeout".to_string(),
            ));
        }
        if let Ok(mode) = env::var("DEBATE_OBSERVER_MODE") {
            cfg.observer_mode = mode.parse()?;
        }
        Ok(cfg)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::config(format!("{name} is not a valid number: '{raw}'"))),
        Err(_) => Ok(None),
    }
}
