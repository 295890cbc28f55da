//! Prompt text for the chat-completions generator.

use crate::ai::request::{HistoryEntry, JudgmentRequest, StatementRequest};
use crate::domain::phase::StatementKind;
use crate::domain::roster::Role;

pub const TOPIC_SYSTEM_PROMPT: &str = "You generate debate topics. \
Produce exactly one interesting, contentious topic on which people can clearly \
take a pro or con side. Write it as a single sentence with no quotes or numbering.";

pub const TOPIC_USER_PROMPT: &str = "Propose a new debate topic.";

pub const JUDGE_SYSTEM_PROMPT: &str = "You are an impartial debate judge.\n\
Criteria: logic 40%, evidence 30%, handling of rebuttals 20%, clarity 10%.\n\
Give every participant a score from 0 to 100 and specific feedback naming \
strengths and improvements. Then decide the winning side (pro, con or draw) \
and write an overall analysis.\n\
Answer with JSON only, in this shape:\n\
{\"winner\": \"pro\" | \"con\" | \"draw\", \
\"scores\": [{\"participant_id\": \"...\", \"score\": 0, \"feedback\": \"...\"}], \
\"overall_analysis\": \"...\"}";

pub fn debater_system_prompt(role: Role, topic: &str) -> String {
    let stance = match role {
        Role::Pro => "in favour of",
        Role::Con => "against",
    };
    format!(
        "You are an automated participant in a team debate.\n\
         Topic: \"{topic}\"\n\
         You argue {stance} the topic.\n\
         Rules:\n\
         1. Always argue {stance} the topic with logical, persuasive reasoning.\n\
         2. Respond concretely to the other side's points.\n\
         3. Prefer evidence and reasoning over emotional language.\n\
         4. Keep the answer to a single focused paragraph."
    )
}

pub fn phase_instruction(kind: Option<StatementKind>) -> &'static str {
    match kind {
        Some(StatementKind::Claim) => "State your position on the topic with a logical argument.",
        Some(StatementKind::Rebuttal) => "Rebut the opposing team's argument logically.",
        Some(StatementKind::Defense) => {
            "Defend your team's position and answer the opposing rebuttal."
        }
        Some(StatementKind::Counter) => "Give a concise counter to the opposing defense.",
        Some(StatementKind::Closing) => {
            "Summarise your final position and close persuasively."
        }
        None => "Make your statement.",
    }
}

fn render_history(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "(no statements yet)".to_string();
    }
    history
        .iter()
        .map(HistoryEntry::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn statement_user_prompt(request: &StatementRequest) -> String {
    format!(
        "{}\n\nDebate so far:\n{}\n\nYour statement:",
        phase_instruction(request.phase.statement_kind()),
        render_history(&request.history)
    )
}

pub fn judge_user_prompt(request: &JudgmentRequest) -> String {
    let participants = request
        .roster
        .iter()
        .map(|p| {
            let side = p.role.map(Role::as_str).unwrap_or("unassigned");
            let kind = if p.is_automated { "automated" } else { "human" };
            format!("- {} ({}, {side}, {kind})", p.id, p.display_name)
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Topic: \"{}\"\n\nParticipants:\n{participants}\n\nTranscript:\n{}",
        request.topic,
        render_history(&request.history)
    )
}
