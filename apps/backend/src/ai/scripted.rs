//! Deterministic generator.
//!
//! Used by the test suites and whenever no API key is configured. Output is a
//! pure function of the request plus an optional seed; call counters and
//! failure switches let tests observe exactly-once dispatch and fallbacks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::prelude::*;

use super::request::{JudgmentDraft, JudgmentRequest, StatementRequest};
use super::trait_def::{AiError, AutomatedResponder};
use crate::domain::roster::Role;
use crate::domain::session::{ParticipantScore, Verdict};
use crate::domain::topics;

#[derive(Debug, Default, Clone, Copy)]
struct Failures {
    statement: bool,
    topic: bool,
    judge: bool,
}

pub struct ScriptedResponder {
    rng: Mutex<StdRng>,
    delay: Option<Duration>,
    failures: Failures,
    statement_calls: AtomicUsize,
    topic_calls: AtomicUsize,
    judge_calls: AtomicUsize,
}

impl ScriptedResponder {
    pub const NAME: &'static str = "scripted";

    /// `Some(seed)` makes topic choice reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
            delay: None,
            failures: Failures::default(),
            statement_calls: AtomicUsize::new(0),
            topic_calls: AtomicUsize::new(0),
            judge_calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_statements(mut self) -> Self {
        self.failures.statement = true;
        self
    }

    pub fn failing_topics(mut self) -> Self {
        self.failures.topic = true;
        self
    }

    pub fn failing_judge(mut self) -> Self {
        self.failures.judge = true;
        self
    }

    pub fn statement_calls(&self) -> usize {
        self.statement_calls.load(Ordering::SeqCst)
    }

    pub fn topic_calls(&self) -> usize {
        self.topic_calls.load(Ordering::SeqCst)
    }

    pub fn judge_calls(&self) -> usize {
        self.judge_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
    }
}

/// Sum of statement lengths per side; the longer side wins.
fn tally(request: &JudgmentRequest) -> JudgmentDraft {
    let mut pro = 0usize;
    let mut con = 0usize;
    let mut scores = Vec::with_capacity(request.roster.len());
    for p in &request.roster {
        let written: usize = request
            .history
            .iter()
            .filter(|h| h.participant_id == p.id)
            .map(|h| h.content.len())
            .sum();
        match p.role {
            Some(Role::Pro) => pro += written,
            Some(Role::Con) => con += written,
            None => {}
        }
        scores.push(ParticipantScore {
            participant_id: p.id.clone(),
            score: (50 + written.min(50)) as u32,
            feedback: format!("{} contributed {written} characters.", p.display_name),
        });
    }
    scores.sort_by(|a, b| a.participant_id.cmp(&b.participant_id));
    let verdict = match pro.cmp(&con) {
        std::cmp::Ordering::Greater => Verdict::Pro,
        std::cmp::Ordering::Less => Verdict::Con,
        std::cmp::Ordering::Equal => Verdict::Draw,
    };
    JudgmentDraft {
        verdict,
        scores,
        overall_analysis: format!(
            "Pro wrote {pro} characters and con wrote {con}; verdict {}.",
            verdict.as_str()
        ),
    }
}

#[async_trait]
impl AutomatedResponder for ScriptedResponder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn generate_statement(&self, request: &StatementRequest) -> Result<String, AiError> {
        self.statement_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failures.statement {
            return Err(AiError::Unavailable("scripted statement failure".into()));
        }
        let side = request
            .target_role()
            .map(Role::as_str)
            .ok_or_else(|| AiError::Malformed(format!("target {} has no role", request.target)))?;
        Ok(format!(
            "[{side}] {} on \"{}\" after {} statements.",
            request.phase,
            request.topic,
            request.history.len()
        ))
    }

    async fn generate_topic(&self) -> Result<String, AiError> {
        self.topic_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failures.topic {
            return Err(AiError::Unavailable("scripted topic failure".into()));
        }
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| AiError::Unavailable(format!("rng lock poisoned: {e}")))?;
        Ok(topics::random_topic(&mut *rng).to_string())
    }

    async fn judge(&self, request: &JudgmentRequest) -> Result<JudgmentDraft, AiError> {
        self.judge_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failures.judge {
            return Err(AiError::Unavailable("scripted judge failure".into()));
        }
        Ok(tally(request))
    }
}
