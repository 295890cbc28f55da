//! Roster types: participants, roles and teams.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::ids::{ParticipantId, SessionId};
use crate::errors::domain::{DomainError, ValidationKind};

/// Debate side a participant argues for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Pro,
    Con,
}

/// Team membership. Pro participants form team A, con participants team B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
}

impl Role {
    pub fn opposite(self) -> Self {
        match self {
            Role::Pro => Role::Con,
            Role::Con => Role::Pro,
        }
    }

    pub fn team(self) -> Team {
        match self {
            Role::Pro => Team::A,
            Role::Con => Team::B,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Pro => "pro",
            Role::Con => "con",
        }
    }
}

impl Team {
    pub fn as_str(self) -> &'static str {
        match self {
            Team::A => "A",
            Team::B => "B",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pro" => Ok(Role::Pro),
            "con" => Ok(Role::Con),
            other => Err(DomainError::validation(
                ValidationKind::InvalidRole,
                format!("role must be 'pro' or 'con', got '{other}'"),
            )),
        }
    }
}

impl FromStr for Team {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Team::A),
            "B" => Ok(Team::B),
            other => Err(DomainError::validation(
                ValidationKind::Other("INVALID_TEAM".into()),
                format!("team must be 'A' or 'B', got '{other}'"),
            )),
        }
    }
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub session_id: SessionId,
    pub display_name: String,
    pub is_automated: bool,
    pub role: Option<Role>,
    pub team: Option<Team>,
}

impl Participant {
    pub fn is_role_bearing(&self) -> bool {
        self.role.is_some()
    }
}

/// Role/team assignment written when role selection is finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    pub participant_id: ParticipantId,
    pub role: Role,
    pub team: Team,
}

impl RoleAssignment {
    pub fn new(participant_id: ParticipantId, role: Role) -> Self {
        Self {
            participant_id,
            role,
            team: role.team(),
        }
    }
}

/// The four seats a running debate expects, resolved from a roster.
///
/// Each slot holds the lowest participant id matching it, so resolution is
/// deterministic even for malformed rosters with duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterSlots {
    pub human_pro: Option<ParticipantId>,
    pub human_con: Option<ParticipantId>,
    pub automated_pro: Option<ParticipantId>,
    pub automated_con: Option<ParticipantId>,
}

impl RosterSlots {
    pub fn resolve(roster: &[Participant]) -> Self {
        let pick = |automated: bool, role: Role| {
            roster
                .iter()
                .filter(|p| p.is_automated == automated && p.role == Some(role))
                .map(|p| p.id.clone())
                .min()
        };
        Self {
            human_pro: pick(false, Role::Pro),
            human_con: pick(false, Role::Con),
            automated_pro: pick(true, Role::Pro),
            automated_con: pick(true, Role::Con),
        }
    }

    pub fn human(&self, role: Role) -> Option<&ParticipantId> {
        match role {
            Role::Pro => self.human_pro.as_ref(),
            Role::Con => self.human_con.as_ref(),
        }
    }

    pub fn automated(&self, role: Role) -> Option<&ParticipantId> {
        match role {
            Role::Pro => self.automated_pro.as_ref(),
            Role::Con => self.automated_con.as_ref(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.human_pro.is_some()
            && self.human_con.is_some()
            && self.automated_pro.is_some()
            && self.automated_con.is_some()
    }
}

/// Non-automated participants, sorted by identity.
pub fn humans(roster: &[Participant]) -> Vec<&Participant> {
    let mut humans: Vec<&Participant> = roster.iter().filter(|p| !p.is_automated).collect();
    humans.sort_by(|a, b| a.id.cmp(&b.id));
    humans
}

/// Automated participants, sorted by identity.
pub fn automated(roster: &[Participant]) -> Vec<&Participant> {
    let mut bots: Vec<&Participant> = roster.iter().filter(|p| p.is_automated).collect();
    bots.sort_by(|a, b| a.id.cmp(&b.id));
    bots
}

/// Leader among the non-automated participants: the lexicographically
/// smallest identity. Recomputed from the roster on every call.
pub fn elect_leader(roster: &[Participant]) -> Option<&ParticipantId> {
    roster
        .iter()
        .filter(|p| !p.is_automated)
        .map(|p| &p.id)
        .min()
}
