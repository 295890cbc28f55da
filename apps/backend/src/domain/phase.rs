//! The phase graph: fixed order, time budgets and per-phase submitter rules.
//!
//! Every per-phase decision (who submits, whether automated participants are
//! involved, which prompt a generator should use) is a table lookup on
//! [`Phase`]. Nothing matches on phase names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::roster::Role;
use crate::errors::domain::{DomainError, ValidationKind};

/// Declaration order is the phase order, so `Ord` follows the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Forming,
    RoleSelection,
    OpeningClaim,
    Cycle1ProRebuttal,
    Cycle1ConDefense,
    Cycle1ProCounter,
    Cycle2ConRebuttal,
    Cycle2ProDefense,
    Cycle2ConCounter,
    Cycle3ProAiRebuttal,
    Cycle3ConDefense,
    Cycle3ProAiCounter,
    Cycle4ConAiRebuttal,
    Cycle4ProDefense,
    Cycle4ConAiCounter,
    ClosingStatement,
    Judging,
    Concluded,
}

pub const PHASE_ORDER: [Phase; 18] = [
    Phase::Forming,
    Phase::RoleSelection,
    Phase::OpeningClaim,
    Phase::Cycle1ProRebuttal,
    Phase::Cycle1ConDefense,
    Phase::Cycle1ProCounter,
    Phase::Cycle2ConRebuttal,
    Phase::Cycle2ProDefense,
    Phase::Cycle2ConCounter,
    Phase::Cycle3ProAiRebuttal,
    Phase::Cycle3ConDefense,
    Phase::Cycle3ProAiCounter,
    Phase::Cycle4ConAiRebuttal,
    Phase::Cycle4ProDefense,
    Phase::Cycle4ConAiCounter,
    Phase::ClosingStatement,
    Phase::Judging,
    Phase::Concluded,
];

/// Classification of a phase by who is expected to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    /// Never completes on submissions (forming, role selection, judging, concluded)
    NonProgressing,
    /// Every role-bearing participant submits independently
    Simultaneous,
    /// One designated non-automated participant
    SingleTurn,
    /// Every participant on one team
    TeamDefense,
    /// One designated automated participant
    AutomatedTurn,
}

/// Designated-submitter rule, resolved against a roster by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitterRule {
    Nobody,
    AllRoleBearing,
    Human(Role),
    Automated(Role),
    Team(Role),
}

/// Statement style requested from participants and generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Claim,
    Rebuttal,
    Defense,
    Counter,
    Closing,
}

impl Phase {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Next phase in order; `None` for the terminal phase.
    pub fn successor(self) -> Option<Phase> {
        PHASE_ORDER.get(self.index() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Concluded
    }

    /// True for the phases between role selection and judging.
    pub fn is_main_sequence(self) -> bool {
        self >= Phase::OpeningClaim && self <= Phase::ClosingStatement
    }

    /// Time budget in seconds, or `None` for untimed phases.
    pub fn time_budget_secs(self) -> Option<i64> {
        match self {
            Phase::Forming | Phase::RoleSelection | Phase::Judging | Phase::Concluded => None,
            Phase::OpeningClaim | Phase::Cycle1ProRebuttal => Some(120),
            Phase::Cycle1ConDefense
            | Phase::Cycle2ConRebuttal
            | Phase::Cycle2ProDefense
            | Phase::Cycle3ConDefense
            | Phase::Cycle4ProDefense => Some(90),
            Phase::Cycle1ProCounter
            | Phase::Cycle2ConCounter
            | Phase::Cycle3ProAiCounter
            | Phase::Cycle4ConAiCounter
            | Phase::ClosingStatement => Some(60),
            Phase::Cycle3ProAiRebuttal | Phase::Cycle4ConAiRebuttal => Some(10),
        }
    }

    pub fn time_budget(self) -> Option<time::Duration> {
        self.time_budget_secs().map(time::Duration::seconds)
    }

    pub fn submitter_rule(self) -> SubmitterRule {
        use Role::{Con, Pro};
        match self {
            Phase::Forming | Phase::RoleSelection | Phase::Judging | Phase::Concluded => {
                SubmitterRule::Nobody
            }
            Phase::OpeningClaim | Phase::ClosingStatement => SubmitterRule::AllRoleBearing,
            Phase::Cycle1ProRebuttal | Phase::Cycle1ProCounter => SubmitterRule::Human(Pro),
            Phase::Cycle2ConRebuttal | Phase::Cycle2ConCounter => SubmitterRule::Human(Con),
            Phase::Cycle3ProAiRebuttal | Phase::Cycle3ProAiCounter => {
                SubmitterRule::Automated(Pro)
            }
            Phase::Cycle4ConAiRebuttal | Phase::Cycle4ConAiCounter => {
                SubmitterRule::Automated(Con)
            }
            Phase::Cycle1ConDefense | Phase::Cycle3ConDefense => SubmitterRule::Team(Con),
            Phase::Cycle2ProDefense | Phase::Cycle4ProDefense => SubmitterRule::Team(Pro),
        }
    }

    pub fn kind(self) -> PhaseKind {
        match self.submitter_rule() {
            SubmitterRule::Nobody => PhaseKind::NonProgressing,
            SubmitterRule::AllRoleBearing => PhaseKind::Simultaneous,
            SubmitterRule::Human(_) => PhaseKind::SingleTurn,
            SubmitterRule::Automated(_) => PhaseKind::AutomatedTurn,
            SubmitterRule::Team(_) => PhaseKind::TeamDefense,
        }
    }

    pub fn statement_kind(self) -> Option<StatementKind> {
        match self {
            Phase::OpeningClaim => Some(StatementKind::Claim),
            Phase::Cycle1ProRebuttal
            | Phase::Cycle2ConRebuttal
            | Phase::Cycle3ProAiRebuttal
            | Phase::Cycle4ConAiRebuttal => Some(StatementKind::Rebuttal),
            Phase::Cycle1ConDefense
            | Phase::Cycle2ProDefense
            | Phase::Cycle3ConDefense
            | Phase::Cycle4ProDefense => Some(StatementKind::Defense),
            Phase::Cycle1ProCounter
            | Phase::Cycle2ConCounter
            | Phase::Cycle3ProAiCounter
            | Phase::Cycle4ConAiCounter => Some(StatementKind::Counter),
            Phase::ClosingStatement => Some(StatementKind::Closing),
            Phase::Forming | Phase::RoleSelection | Phase::Judging | Phase::Concluded => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Forming => "forming",
            Phase::RoleSelection => "role_selection",
            Phase::OpeningClaim => "opening_claim",
            Phase::Cycle1ProRebuttal => "cycle1_pro_rebuttal",
            Phase::Cycle1ConDefense => "cycle1_con_defense",
            Phase::Cycle1ProCounter => "cycle1_pro_counter",
            Phase::Cycle2ConRebuttal => "cycle2_con_rebuttal",
            Phase::Cycle2ProDefense => "cycle2_pro_defense",
            Phase::Cycle2ConCounter => "cycle2_con_counter",
            Phase::Cycle3ProAiRebuttal => "cycle3_pro_ai_rebuttal",
            Phase::Cycle3ConDefense => "cycle3_con_defense",
            Phase::Cycle3ProAiCounter => "cycle3_pro_ai_counter",
            Phase::Cycle4ConAiRebuttal => "cycle4_con_ai_rebuttal",
            Phase::Cycle4ProDefense => "cycle4_pro_defense",
            Phase::Cycle4ConAiCounter => "cycle4_con_ai_counter",
            Phase::ClosingStatement => "closing_statement",
            Phase::Judging => "judging",
            Phase::Concluded => "concluded",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PHASE_ORDER
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation(ValidationKind::InvalidPhase, format!("unknown phase '{s}'"))
            })
    }
}
