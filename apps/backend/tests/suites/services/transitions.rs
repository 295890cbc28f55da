use backend::domain::phase::{Phase, PHASE_ORDER};
use backend::errors::ErrorCode;
use backend::services::debate_flow::{AdvanceOutcome, JudgingOutcome};

use crate::support::debate_setup::{advance_to, count_advanced, in_opening, started, Harness};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_timer_advances_have_exactly_one_winner() {
    let h = Harness::new();
    let debate = in_opening(&h).await;
    let before = h.state(&debate.session_id).await;

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let flow = h.flow.clone();
        let id = debate.session_id.clone();
        tasks.push(tokio::spawn(async move {
            flow.try_advance(&id, Phase::OpeningClaim).await
        }));
    }
    let mut outcomes = Vec::new();
    for task in tasks {
        outcomes.push(task.await.expect("join").expect("advance"));
    }

    assert_eq!(count_advanced(&outcomes), 1);
    let after = h.state(&debate.session_id).await;
    assert_eq!(after.phase, Phase::Cycle1ProRebuttal);
    assert_eq!(after.version, before.version + 1);
}

#[tokio::test]
async fn stale_expected_phase_is_a_noop() {
    let h = Harness::new();
    let debate = in_opening(&h).await;

    let first = h
        .flow
        .try_advance(&debate.session_id, Phase::OpeningClaim)
        .await
        .unwrap();
    assert!(first.advanced());
    let version = h.state(&debate.session_id).await.version;

    let second = h
        .flow
        .try_advance(&debate.session_id, Phase::OpeningClaim)
        .await
        .unwrap();
    assert_eq!(second, AdvanceOutcome::Noop);
    assert_eq!(h.state(&debate.session_id).await.version, version);
}

#[tokio::test]
async fn entering_a_phase_sets_its_deadline() {
    let h = Harness::new();
    let debate = in_opening(&h).await;

    let state = h.state(&debate.session_id).await;
    assert_eq!(
        state.timer_deadline,
        Some(state.phase_entered_at + time::Duration::seconds(120))
    );

    advance_to(&h, &debate.session_id, Phase::Cycle3ProAiRebuttal).await;
    let state = h.state(&debate.session_id).await;
    assert_eq!(
        state.timer_deadline,
        Some(state.phase_entered_at + time::Duration::seconds(10))
    );
}

#[tokio::test]
async fn untimed_phases_do_not_advance_generically() {
    let h = Harness::new();
    let debate = started(&h).await;

    for phase in [Phase::Forming, Phase::RoleSelection, Phase::Judging] {
        let err = h
            .flow
            .try_advance(&debate.session_id, phase)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPhase, "{phase}");
    }
    assert_eq!(
        h.flow
            .try_advance(&debate.session_id, Phase::Concluded)
            .await
            .unwrap(),
        AdvanceOutcome::Noop
    );
    assert_eq!(h.state(&debate.session_id).await.phase, Phase::RoleSelection);
}

#[tokio::test]
async fn timers_alone_carry_a_debate_to_judging() {
    let h = Harness::new();
    let debate = in_opening(&h).await;

    advance_to(&h, &debate.session_id, Phase::Judging).await;
    let state = h.state(&debate.session_id).await;
    assert_eq!(state.timer_deadline, None);

    let visited = PHASE_ORDER
        .iter()
        .filter(|p| p.is_main_sequence())
        .count() as i32;
    // created at 1; start, first pick and finalize; then one write per phase
    assert_eq!(state.version, 4 + visited);

    let outcome = h.flow.run_judging(&debate.session_id).await.unwrap();
    assert_eq!(outcome, JudgingOutcome::Concluded);
    assert_eq!(h.state(&debate.session_id).await.phase, Phase::Concluded);
}
