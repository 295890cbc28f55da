//! Role-conflict resolution during `role_selection`.
//!
//! Picks live in the coordination record as `pro_pick`/`con_pick`. A pick
//! into a free slot is recorded; a pick into a slot already held by the
//! other participant is a same-role conflict.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::ids::ParticipantId;
use crate::domain::roster::{Role, RoleAssignment};
use crate::domain::session::SessionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleResolution {
    /// Participant already holds a pick; nothing to write.
    AlreadyPicked(Role),
    /// Record the pick and keep awaiting the other participant.
    Waiting,
    /// Both sides are taken by different participants.
    Finalize {
        pro: ParticipantId,
        con: ParticipantId,
    },
    /// Same-role conflict below the bound: new topic, picks cleared.
    RetryWithNewTopic { next_conflict_count: u32 },
    /// Same-role conflict at or past the bound.
    RandomAssign,
}

/// Decide what a pick of `role` by `participant` does to `state`.
pub fn resolve_pick(
    state: &SessionState,
    participant: &ParticipantId,
    role: Role,
    conflict_bound: u32,
) -> RoleResolution {
    if let Some(existing) = state.picked_role(participant) {
        return RoleResolution::AlreadyPicked(existing);
    }
    match state.pick_of(role) {
        Some(_) => resolve_conflict(state.topic_conflict_count, conflict_bound),
        None => match state.pick_of(role.opposite()) {
            Some(other) => {
                let (pro, con) = match role {
                    Role::Pro => (participant.clone(), other.clone()),
                    Role::Con => (other.clone(), participant.clone()),
                };
                RoleResolution::Finalize { pro, con }
            }
            None => RoleResolution::Waiting,
        },
    }
}

/// Outcome of a same-role conflict given the prior conflict count.
pub fn resolve_conflict(conflict_count: u32, conflict_bound: u32) -> RoleResolution {
    if conflict_count < conflict_bound {
        RoleResolution::RetryWithNewTopic {
            next_conflict_count: conflict_count + 1,
        }
    } else {
        RoleResolution::RandomAssign
    }
}

/// Both picks, when held by two different participants.
pub fn distinct_picks(state: &SessionState) -> Option<(ParticipantId, ParticipantId)> {
    match (&state.pro_pick, &state.con_pick) {
        (Some(pro), Some(con)) if pro != con => Some((pro.clone(), con.clone())),
        _ => None,
    }
}

/// Full assignment for the two humans and the automated participants.
/// Automated participants are taken in identity order: first pro, second con.
pub fn assignments_from_picks(
    pro: &ParticipantId,
    con: &ParticipantId,
    automated: &[ParticipantId],
) -> Vec<RoleAssignment> {
    let mut out = vec![
        RoleAssignment::new(pro.clone(), Role::Pro),
        RoleAssignment::new(con.clone(), Role::Con),
    ];
    let mut bots = automated.to_vec();
    bots.sort();
    for (bot, role) in bots.into_iter().zip([Role::Pro, Role::Con]) {
        out.push(RoleAssignment::new(bot, role));
    }
    out
}

/// Random distinct roles for the humans, ignoring their picks.
pub fn random_assignments<R: Rng + ?Sized>(
    humans: &[ParticipantId],
    automated: &[ParticipantId],
    rng: &mut R,
) -> Option<Vec<RoleAssignment>> {
    if humans.len() < 2 {
        return None;
    }
    let mut shuffled = humans.to_vec();
    shuffled.sort();
    shuffled.shuffle(rng);
    Some(assignments_from_picks(&shuffled[0], &shuffled[1], automated))
}
