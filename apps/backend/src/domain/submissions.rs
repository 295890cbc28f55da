//! Submission tracker: required-submitter sets and completeness.

use std::collections::BTreeSet;

use crate::domain::ids::ParticipantId;
use crate::domain::phase::{Phase, SubmitterRule};
use crate::domain::roster::{Participant, Role, RosterSlots};
use crate::domain::session::Submission;

/// Participants who must submit for `phase` to be complete.
///
/// Empty for non-progressing phases and for any roster missing one of the
/// four expected seats; such phases only advance by timer.
pub fn required_submitters(phase: Phase, roster: &[Participant]) -> BTreeSet<ParticipantId> {
    let rule = phase.submitter_rule();
    if rule == SubmitterRule::Nobody {
        return BTreeSet::new();
    }
    let slots = RosterSlots::resolve(roster);
    if !slots.is_complete() {
        return BTreeSet::new();
    }
    let seat = |id: Option<&ParticipantId>| id.cloned().into_iter();
    match rule {
        SubmitterRule::Nobody => BTreeSet::new(),
        SubmitterRule::AllRoleBearing => [Role::Pro, Role::Con]
            .into_iter()
            .flat_map(|role| seat(slots.human(role)).chain(seat(slots.automated(role))))
            .collect(),
        SubmitterRule::Human(role) => seat(slots.human(role)).collect(),
        SubmitterRule::Automated(role) => seat(slots.automated(role)).collect(),
        SubmitterRule::Team(role) => seat(slots.human(role))
            .chain(seat(slots.automated(role)))
            .collect(),
    }
}

/// Required automated participants for `phase`, in identity order.
pub fn required_automated(phase: Phase, roster: &[Participant]) -> Vec<ParticipantId> {
    let required = required_submitters(phase, roster);
    let mut automated: Vec<ParticipantId> = roster
        .iter()
        .filter(|p| p.is_automated && required.contains(&p.id))
        .map(|p| p.id.clone())
        .collect();
    automated.sort();
    automated.dedup();
    automated
}

/// Whether `participant` has a submission recorded for `phase`.
pub fn has_submitted(phase: Phase, participant: &ParticipantId, submissions: &[Submission]) -> bool {
    submissions
        .iter()
        .any(|s| s.phase == phase && &s.participant_id == participant)
}

/// True iff the required set is non-empty and every member has submitted.
/// Submissions from outside the required set are ignored.
pub fn is_complete(phase: Phase, roster: &[Participant], submissions: &[Submission]) -> bool {
    let required = required_submitters(phase, roster);
    !required.is_empty()
        && required
            .iter()
            .all(|id| has_submitted(phase, id, submissions))
}

/// Required participants still missing a submission for `phase`.
pub fn outstanding(
    phase: Phase,
    roster: &[Participant],
    submissions: &[Submission],
) -> BTreeSet<ParticipantId> {
    required_submitters(phase, roster)
        .into_iter()
        .filter(|id| !has_submitted(phase, id, submissions))
        .collect()
}
