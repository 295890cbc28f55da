// apps/backend/src/domain/session_transition.rs

use serde::Serialize;

use crate::domain::phase::Phase;
use crate::domain::session::SessionState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionTransition {
    /// Edge-triggered: the phase moved forward.
    PhaseEntered { from: Phase, to: Phase },

    /// Edge-triggered: forming -> role_selection
    SessionStarted,

    /// Edge-triggered: role_selection -> opening_claim
    RolesFinalized,

    /// Same-role conflict reset the topic and cleared picks.
    TopicReset { conflict_count: u32 },

    /// A role pick was recorded without finishing selection.
    PickRecorded,

    /// Edge-triggered: reached the terminal phase
    Concluded,
}

/// Derive transitions from before/after coordination records.
pub fn derive_session_transitions(
    before: &SessionState,
    after: &SessionState,
) -> Vec<SessionTransition> {
    let mut transitions = Vec::new();

    if before.phase != after.phase {
        transitions.push(SessionTransition::PhaseEntered {
            from: before.phase,
            to: after.phase,
        });
        if before.phase == Phase::Forming {
            transitions.push(SessionTransition::SessionStarted);
        }
        if before.phase == Phase::RoleSelection {
            transitions.push(SessionTransition::RolesFinalized);
        }
        if after.phase == Phase::Concluded {
            transitions.push(SessionTransition::Concluded);
        }
        return transitions;
    }

    if after.topic_conflict_count > before.topic_conflict_count {
        transitions.push(SessionTransition::TopicReset {
            conflict_count: after.topic_conflict_count,
        });
    } else if (after.pro_pick.is_some() && before.pro_pick.is_none())
        || (after.con_pick.is_some() && before.con_pick.is_none())
    {
        transitions.push(SessionTransition::PickRecorded);
    }

    transitions
}
