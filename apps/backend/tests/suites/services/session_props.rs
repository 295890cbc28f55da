// Integration property tests for the phase graph under arbitrary interleavings
// of timer expiries, human submissions and automated turns.

use backend::domain::phase::Phase;
use backend::domain::session::SessionState;
use backend::errors::ErrorCode;
use proptest::prelude::*;

use crate::common::proptest_prelude::proptest_prelude_config;
use crate::support::debate_setup::{in_opening, Debate, Harness};

#[derive(Debug, Clone, Copy)]
enum Step {
    Timer,
    StaleTimer,
    Human(usize),
    Bot(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => Just(Step::Timer),
        1 => Just(Step::StaleTimer),
        3 => (0..2usize).prop_map(Step::Human),
        3 => (0..2usize).prop_map(Step::Bot),
    ]
}

async fn apply(h: &Harness, debate: &Debate, before: &SessionState, step: Step) {
    let id = &debate.session_id;
    let phase = before.phase;
    if !phase.is_main_sequence() {
        return;
    }
    match step {
        Step::Timer => {
            h.flow.try_advance(id, phase).await.expect("timer advance");
        }
        Step::StaleTimer => {
            if phase > Phase::OpeningClaim {
                let outcome = h
                    .flow
                    .try_advance(id, Phase::OpeningClaim)
                    .await
                    .expect("stale advance");
                assert!(!outcome.advanced(), "stale timer moved {phase}");
            }
        }
        Step::Human(n) => {
            let who = if n == 0 { &debate.first } else { &debate.second };
            if let Err(e) = h.flow.submit(id, who, "a point", Some(phase)).await {
                assert_eq!(e.code(), ErrorCode::NotRequiredSubmitter);
            }
        }
        Step::Bot(n) => {
            let bot = &debate.automated()[n];
            if let Err(e) = h.flow.produce_automated_turn(id, phase, bot).await {
                assert_eq!(e.code(), ErrorCode::NotRequiredSubmitter);
            }
        }
    }
}

proptest! {
    #![proptest_config(proptest_prelude_config())]

    /// Property: the phase moves one edge at a time and every move costs
    /// exactly one version; no participant speaks twice in a phase.
    #[test]
    fn prop_phase_moves_one_edge_per_version(steps in prop::collection::vec(step(), 1..60)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        rt.block_on(async {
            let h = Harness::new();
            let debate = in_opening(&h).await;
            let mut before = h.state(&debate.session_id).await;

            for step in steps {
                apply(&h, &debate, &before, step).await;
                let after = h.state(&debate.session_id).await;
                if after.phase == before.phase {
                    assert_eq!(after.version, before.version, "{step:?} wrote without moving");
                } else {
                    assert_eq!(Some(after.phase), before.phase.successor(), "{step:?} skipped");
                    assert_eq!(after.version, before.version + 1);
                }
                before = after;
            }

            let submissions = h.submissions(&debate.session_id).await;
            let mut keys: Vec<_> = submissions
                .iter()
                .map(|s| (s.participant_id.clone(), s.phase))
                .collect();
            let total = keys.len();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), total);
        });
    }
}
