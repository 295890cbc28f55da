//! Generator request and response payloads.

use serde::{Deserialize, Serialize};

use crate::domain::ids::{ParticipantId, SessionId};
use crate::domain::phase::Phase;
use crate::domain::roster::{Participant, Role};
use crate::domain::session::{ParticipantScore, Submission, Verdict};

/// One prior statement with its author resolved against the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub role: Option<Role>,
    pub is_automated: bool,
    pub phase: Phase,
    pub content: String,
}

impl HistoryEntry {
    /// Attribute submissions (already in creation order) to roster entries.
    pub fn attribute(submissions: &[Submission], roster: &[Participant]) -> Vec<Self> {
        submissions
            .iter()
            .map(|s| {
                let author = roster.iter().find(|p| p.id == s.participant_id);
                HistoryEntry {
                    participant_id: s.participant_id.clone(),
                    display_name: author
                        .map(|p| p.display_name.clone())
                        .unwrap_or_else(|| s.participant_id.to_string()),
                    role: author.and_then(|p| p.role),
                    is_automated: author.is_some_and(|p| p.is_automated),
                    phase: s.phase,
                    content: s.content.clone(),
                }
            })
            .collect()
    }

    /// `[pro (automated)] Name: text`
    pub fn render(&self) -> String {
        let side = self.role.map(Role::as_str).unwrap_or("unassigned");
        let marker = if self.is_automated { " (automated)" } else { "" };
        format!("[{side}{marker}] {}: {}", self.display_name, self.content)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementRequest {
    pub session_id: SessionId,
    pub phase: Phase,
    pub topic: String,
    pub history: Vec<HistoryEntry>,
    pub roster: Vec<Participant>,
    pub target: ParticipantId,
}

impl StatementRequest {
    /// Role of the targeted automated participant.
    pub fn target_role(&self) -> Option<Role> {
        self.roster
            .iter()
            .find(|p| p.id == self.target)
            .and_then(|p| p.role)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JudgmentRequest {
    pub session_id: SessionId,
    pub topic: String,
    pub history: Vec<HistoryEntry>,
    pub roster: Vec<Participant>,
}

/// Verdict as produced by a generator, before it is stamped and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentDraft {
    pub verdict: Verdict,
    pub scores: Vec<ParticipantScore>,
    pub overall_analysis: String,
}
