//! Chat-completions generator over HTTP.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::config::{GeneratorConfig, Sampling};
use super::prompts;
use super::request::{JudgmentDraft, JudgmentRequest, StatementRequest};
use super::trait_def::{AiError, AutomatedResponder};
use crate::domain::ids::ParticipantId;
use crate::domain::session::{ParticipantScore, Verdict};
use crate::logging::Excerpt;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Raw verdict as the model writes it.
#[derive(Debug, Deserialize)]
struct VerdictPayload {
    winner: String,
    #[serde(default)]
    scores: Vec<ScorePayload>,
    #[serde(default)]
    overall_analysis: String,
}

#[derive(Debug, Deserialize)]
struct ScorePayload {
    participant_id: String,
    score: f64,
    #[serde(default)]
    feedback: String,
}

pub struct OpenAiResponder {
    client: reqwest::Client,
    api_key: String,
    config: GeneratorConfig,
}

impl OpenAiResponder {
    pub const NAME: &'static str = "openai";

    pub fn new(api_key: String, config: GeneratorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            config,
        }
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        sampling: Sampling,
        json_mode: bool,
    ) -> Result<String, AiError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: sampling.max_tokens,
            temperature: sampling.temperature,
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .client
            .post(self.config.chat_completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout
                } else {
                    AiError::Unavailable(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Unavailable(format!("upstream status {status}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::Malformed(format!("response body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AiError::Malformed("empty completion".into()))?;

        debug!(model = %self.config.model, excerpt = %Excerpt(&content), "Completion received");
        Ok(content)
    }
}

/// Turn the model's JSON into a draft, clamping scores into 0..=100.
fn parse_verdict(raw: &str) -> Result<JudgmentDraft, AiError> {
    let payload: VerdictPayload =
        serde_json::from_str(raw).map_err(|e| AiError::Malformed(format!("verdict json: {e}")))?;
    let verdict = match payload.winner.trim().to_ascii_lowercase().as_str() {
        "pro" => Verdict::Pro,
        "con" => Verdict::Con,
        "draw" => Verdict::Draw,
        other => return Err(AiError::Malformed(format!("unknown winner '{other}'"))),
    };

    // Last entry per participant wins if the model repeats one.
    let mut by_id: HashMap<String, ScorePayload> = HashMap::new();
    for s in payload.scores {
        by_id.insert(s.participant_id.clone(), s);
    }
    let mut scores: Vec<ParticipantScore> = by_id
        .into_values()
        .map(|s| ParticipantScore {
            participant_id: ParticipantId::from(s.participant_id),
            score: s.score.clamp(0.0, 100.0).round() as u32,
            feedback: s.feedback,
        })
        .collect();
    scores.sort_by(|a, b| a.participant_id.cmp(&b.participant_id));

    Ok(JudgmentDraft {
        verdict,
        scores,
        overall_analysis: payload.overall_analysis,
    })
}

#[async_trait]
impl AutomatedResponder for OpenAiResponder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn generate_statement(&self, request: &StatementRequest) -> Result<String, AiError> {
        let role = request.target_role().ok_or_else(|| {
            AiError::Malformed(format!("target {} has no role", request.target))
        })?;
        let system = prompts::debater_system_prompt(role, &request.topic);
        let user = prompts::statement_user_prompt(request);
        self.complete(&system, &user, self.config.statement, false)
            .await
    }

    async fn generate_topic(&self) -> Result<String, AiError> {
        let topic = self
            .complete(
                prompts::TOPIC_SYSTEM_PROMPT,
                prompts::TOPIC_USER_PROMPT,
                self.config.topic,
                false,
            )
            .await?;
        Ok(topic.trim_matches(|c| c == '"' || c == '\'').to_string())
    }

    async fn judge(&self, request: &JudgmentRequest) -> Result<JudgmentDraft, AiError> {
        let user = prompts::judge_user_prompt(request);
        let raw = self
            .complete(prompts::JUDGE_SYSTEM_PROMPT, &user, self.config.judge, true)
            .await?;
        parse_verdict(&raw)
    }
}
