//! Property tests for the phase graph and submission tracker (pure domain, no DB).

use proptest::prelude::*;
use time::OffsetDateTime;

use crate::domain::ids::{ParticipantId, SessionId};
use crate::domain::phase::{Phase, PhaseKind, PHASE_ORDER};
use crate::domain::roster::{Participant, Role};
use crate::domain::session::Submission;
use crate::domain::submissions::{is_complete, required_submitters};

fn phase() -> impl Strategy<Value = Phase> {
    (0..PHASE_ORDER.len()).prop_map(|i| PHASE_ORDER[i])
}

fn role() -> impl Strategy<Value = Option<Role>> {
    prop_oneof![Just(None), Just(Some(Role::Pro)), Just(Some(Role::Con))]
}

fn participant() -> impl Strategy<Value = Participant> {
    ("[a-f][0-9]", any::<bool>(), role()).prop_map(|(id, automated, role)| Participant {
        id: ParticipantId::from(id.as_str()),
        session_id: SessionId::from("s"),
        display_name: id,
        is_automated: automated,
        role,
        team: role.map(Role::team),
    })
}

fn roster() -> impl Strategy<Value = Vec<Participant>> {
    prop::collection::vec(participant(), 0..8)
}

fn submission(id: &ParticipantId, phase: Phase) -> Submission {
    Submission::new(
        SessionId::from("s"),
        id.clone(),
        phase,
        "statement".into(),
        OffsetDateTime::UNIX_EPOCH,
    )
}

proptest! {
    /// Property: the required set depends only on (phase, roster contents),
    /// never on call count or roster order.
    #[test]
    fn prop_required_set_deterministic(phase in phase(), roster in roster()) {
        let first = required_submitters(phase, &roster);
        prop_assert_eq!(&first, &required_submitters(phase, &roster));

        let mut reversed = roster.clone();
        reversed.reverse();
        prop_assert_eq!(&first, &required_submitters(phase, &reversed));
    }

    /// Property: required submitters are role-bearing roster members and
    /// single-turn phases name exactly one non-automated participant.
    #[test]
    fn prop_required_set_drawn_from_roster(phase in phase(), roster in roster()) {
        let required = required_submitters(phase, &roster);
        for id in &required {
            let member = roster.iter().find(|p| &p.id == id && p.role.is_some());
            prop_assert!(member.is_some(), "{id} not a role-bearing member");
        }
        match phase.kind() {
            PhaseKind::NonProgressing => prop_assert!(required.is_empty()),
            PhaseKind::SingleTurn | PhaseKind::AutomatedTurn => prop_assert!(required.len() <= 1),
            _ => prop_assert!(required.len() <= 4),
        }
    }

    /// Property: completeness holds exactly when every required id submitted.
    #[test]
    fn prop_complete_iff_all_required_submitted(
        phase in phase(),
        roster in roster(),
        skip in any::<prop::sample::Index>(),
    ) {
        let required: Vec<ParticipantId> = required_submitters(phase, &roster).into_iter().collect();
        let all: Vec<Submission> = required.iter().map(|id| submission(id, phase)).collect();
        prop_assert_eq!(is_complete(phase, &roster, &all), !required.is_empty());

        if !required.is_empty() {
            let dropped = skip.index(required.len());
            let partial: Vec<Submission> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != dropped)
                .map(|(_, s)| s.clone())
                .collect();
            prop_assert!(!is_complete(phase, &roster, &partial));
        }
    }

    /// Property: successor is strictly later and never skips a phase.
    #[test]
    fn prop_successor_is_next_in_order(phase in phase()) {
        match phase.successor() {
            Some(next) => prop_assert_eq!(next.index(), phase.index() + 1),
            None => prop_assert!(phase.is_terminal()),
        }
    }
}
