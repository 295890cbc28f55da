//! Row <-> domain conversions for the SeaORM session store.

use std::str::FromStr;

use crate::domain::ids::{ParticipantId, SessionId};
use crate::domain::phase::Phase;
use crate::domain::roster::{Participant, Role, Team};
use crate::domain::session::{
    Judgment, ParticipantScore, Session, SessionState, SessionStatus, Submission, Verdict,
};
use crate::entities::participants::{DebateRole, DebateTeam};
use crate::entities::{judgments, participants, session_states, sessions, submissions};
use crate::errors::domain::{DomainError, InfraErrorKind};

fn corrupt(detail: String) -> DomainError {
    DomainError::infra(InfraErrorKind::DataCorruption, detail)
}

pub fn phase_from_row(raw: &str) -> Result<Phase, DomainError> {
    Phase::from_str(raw).map_err(|_| corrupt(format!("stored phase '{raw}' is unknown")))
}

pub fn status_to_row(status: SessionStatus) -> sessions::SessionStatus {
    match status {
        SessionStatus::Forming => sessions::SessionStatus::Forming,
        SessionStatus::Active => sessions::SessionStatus::Active,
        SessionStatus::Concluded => sessions::SessionStatus::Concluded,
    }
}

pub fn role_to_row(role: Role) -> DebateRole {
    match role {
        Role::Pro => DebateRole::Pro,
        Role::Con => DebateRole::Con,
    }
}

pub fn team_to_row(team: Team) -> DebateTeam {
    match team {
        Team::A => DebateTeam::A,
        Team::B => DebateTeam::B,
    }
}

impl From<sessions::Model> for Session {
    fn from(row: sessions::Model) -> Self {
        Self {
            id: SessionId::from(row.id),
            name: row.name,
            status: match row.status {
                sessions::SessionStatus::Forming => SessionStatus::Forming,
                sessions::SessionStatus::Active => SessionStatus::Active,
                sessions::SessionStatus::Concluded => SessionStatus::Concluded,
            },
            created_at: row.created_at,
        }
    }
}

impl From<participants::Model> for Participant {
    fn from(row: participants::Model) -> Self {
        Self {
            id: ParticipantId::from(row.id),
            session_id: SessionId::from(row.session_id),
            display_name: row.display_name,
            is_automated: row.is_automated,
            role: row.role.map(|r| match r {
                DebateRole::Pro => Role::Pro,
                DebateRole::Con => Role::Con,
            }),
            team: row.team.map(|t| match t {
                DebateTeam::A => Team::A,
                DebateTeam::B => Team::B,
            }),
        }
    }
}

pub fn state_from_row(row: session_states::Model) -> Result<SessionState, DomainError> {
    Ok(SessionState {
        session_id: SessionId::from(row.session_id),
        phase: phase_from_row(&row.phase)?,
        timer_deadline: row.timer_deadline,
        phase_entered_at: row.phase_entered_at,
        topic: row.topic,
        topic_conflict_count: u32::try_from(row.topic_conflict_count).map_err(|_| {
            corrupt(format!(
                "negative topic_conflict_count {}",
                row.topic_conflict_count
            ))
        })?,
        pro_pick: row.pro_pick.map(ParticipantId::from),
        con_pick: row.con_pick.map(ParticipantId::from),
        version: row.version,
    })
}

pub fn submission_from_row(row: submissions::Model) -> Result<Submission, DomainError> {
    Ok(Submission {
        id: row.id,
        session_id: SessionId::from(row.session_id),
        participant_id: ParticipantId::from(row.participant_id),
        phase: phase_from_row(&row.phase)?,
        content: row.content,
        created_at: row.created_at,
    })
}

pub fn judgment_from_row(row: judgments::Model) -> Result<Judgment, DomainError> {
    let verdict = match row.verdict.as_str() {
        "pro" => Verdict::Pro,
        "con" => Verdict::Con,
        "draw" => Verdict::Draw,
        other => return Err(corrupt(format!("stored verdict '{other}' is unknown"))),
    };
    let scores: Vec<ParticipantScore> = serde_json::from_value(row.scores)
        .map_err(|e| corrupt(format!("stored judgment scores unreadable: {e}")))?;
    Ok(Judgment {
        session_id: SessionId::from(row.session_id),
        verdict,
        scores,
        overall_analysis: row.overall_analysis,
        created_at: row.created_at,
    })
}
