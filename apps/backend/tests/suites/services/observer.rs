use std::time::Duration;

use backend::ai::ScriptedResponder;
use backend::config::debate::ObserverMode;
use backend::domain::phase::Phase;
use backend::domain::roster::Role;
use backend::services::observer::ObserverRegistry;

use crate::support::debate_setup::{
    advance_to, in_opening, seated, submit_human, test_config, wait_for_phase, Harness,
};

const WITHIN: Duration = Duration::from_secs(5);

async fn observers_drive_the_opening(mode: ObserverMode) {
    let h = Harness::with(
        test_config().with_observer_mode(mode),
        ScriptedResponder::new(Some(4)),
    );
    let debate = seated(&h).await;
    let registry = ObserverRegistry::new();
    assert!(registry.ensure(&h.flow, &debate.session_id, &debate.first));
    assert!(registry.ensure(&h.flow, &debate.session_id, &debate.second));

    // the leader starts the session on its own
    wait_for_phase(&h, &debate.session_id, Phase::RoleSelection, WITHIN).await;
    h.flow
        .select_role(&debate.session_id, &debate.first, Role::Pro)
        .await
        .unwrap();
    h.flow
        .select_role(&debate.session_id, &debate.second, Role::Con)
        .await
        .unwrap();
    wait_for_phase(&h, &debate.session_id, Phase::OpeningClaim, WITHIN).await;

    submit_human(&h, &debate, &debate.first, "Pro opening").await;
    submit_human(&h, &debate, &debate.second, "Con opening").await;
    wait_for_phase(&h, &debate.session_id, Phase::Cycle1ProRebuttal, WITHIN).await;

    // both automated openings, each exactly once
    assert_eq!(h.responder.statement_calls(), 2);
    let opening = h
        .submissions(&debate.session_id)
        .await
        .into_iter()
        .filter(|s| s.phase == Phase::OpeningClaim)
        .count();
    assert_eq!(opening, 4);

    registry.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn polling_observers_drive_the_opening() {
    observers_drive_the_opening(ObserverMode::Poll).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn streaming_observers_drive_the_opening() {
    observers_drive_the_opening(ObserverMode::Stream).await;
}

#[tokio::test]
async fn registry_runs_one_observer_per_participant() {
    let h = Harness::new();
    let debate = seated(&h).await;
    let registry = ObserverRegistry::new();

    assert!(registry.ensure(&h.flow, &debate.session_id, &debate.first));
    assert!(!registry.ensure(&h.flow, &debate.session_id, &debate.first));
    assert_eq!(registry.len(), 1);

    registry.shutdown();
    let deadline = tokio::time::Instant::now() + WITHIN;
    while !registry.is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "observer ignored shutdown");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn only_the_leader_starts_a_forming_session() {
    let h = Harness::new();
    let debate = seated(&h).await;

    let follower = h
        .flow
        .evaluate(&debate.session_id, debate.follower())
        .await
        .unwrap();
    assert!(!follower.advanced);
    assert_eq!(follower.state.phase, Phase::Forming);

    let leader = h
        .flow
        .evaluate(&debate.session_id, debate.leader())
        .await
        .unwrap();
    assert!(leader.advanced);
    assert_eq!(leader.state.phase, Phase::RoleSelection);
}

#[tokio::test]
async fn evaluation_concludes_from_judging() {
    let h = Harness::new();
    let debate = in_opening(&h).await;
    advance_to(&h, &debate.session_id, Phase::Judging).await;

    let follower = h
        .flow
        .evaluate(&debate.session_id, debate.follower())
        .await
        .unwrap();
    assert!(!follower.advanced);
    assert_eq!(h.responder.judge_calls(), 0);

    let leader = h
        .flow
        .evaluate(&debate.session_id, debate.leader())
        .await
        .unwrap();
    assert!(leader.advanced);
    assert_eq!(leader.state.phase, Phase::Concluded);
    assert!(leader.state.phase.is_terminal());
}
