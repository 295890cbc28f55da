use std::time::Duration;

use backend::ai::ScriptedResponder;
use backend::domain::phase::Phase;
use backend::domain::session::{SessionStatus, Verdict};
use backend::errors::ErrorCode;
use backend::repos::session_store::{ClaimTarget, DispatchClaim};
use backend::services::debate_flow::JudgingOutcome;

use crate::support::debate_setup::{advance_to, in_opening, submit_human, test_config, Harness};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn judgment_is_produced_once_and_concludes() {
    let h = Harness::with_responder(
        ScriptedResponder::new(Some(2)).with_delay(Duration::from_millis(30)),
    );
    let debate = in_opening(&h).await;
    submit_human(&h, &debate, &debate.first, "A long and well argued opening for pro.").await;
    advance_to(&h, &debate.session_id, Phase::Judging).await;

    let mut tasks = Vec::new();
    for _ in 0..6 {
        let flow = h.flow.clone();
        let id = debate.session_id.clone();
        tasks.push(tokio::spawn(async move { flow.run_judging(&id).await }));
    }
    for task in tasks {
        let outcome = task.await.expect("join").unwrap();
        assert!(
            matches!(
                outcome,
                JudgingOutcome::Concluded | JudgingOutcome::InFlight | JudgingOutcome::Noop
            ),
            "{outcome:?}"
        );
    }

    assert_eq!(h.responder.judge_calls(), 1);
    let snapshot = h
        .flow
        .store()
        .load_snapshot(&debate.session_id)
        .await
        .unwrap();
    assert_eq!(snapshot.state.phase, Phase::Concluded);
    assert_eq!(snapshot.session.status, SessionStatus::Concluded);
    let judgment = snapshot.judgment.expect("judgment recorded");
    assert_eq!(judgment.verdict, Verdict::Pro);
    assert_eq!(judgment.scores.len(), 4);
}

#[tokio::test]
async fn failed_judgment_stays_in_judging_and_retries() {
    let h = Harness::with_responder(ScriptedResponder::new(Some(2)).failing_judge());
    let debate = in_opening(&h).await;
    advance_to(&h, &debate.session_id, Phase::Judging).await;

    for attempt in 1..=2 {
        let err = h.flow.run_judging(&debate.session_id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::GeneratorUnavailable);
        assert_eq!(h.responder.judge_calls(), attempt);
    }
    assert_eq!(h.state(&debate.session_id).await.phase, Phase::Judging);
    assert!(h
        .flow
        .store()
        .load_judgment(&debate.session_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn judging_elsewhere_is_a_noop() {
    let h = Harness::new();
    let debate = in_opening(&h).await;

    let outcome = h.flow.run_judging(&debate.session_id).await.unwrap();
    assert_eq!(outcome, JudgingOutcome::Noop);
    assert_eq!(h.responder.judge_calls(), 0);
}

#[tokio::test]
async fn concluded_session_is_terminal() {
    let h = Harness::new();
    let debate = in_opening(&h).await;
    advance_to(&h, &debate.session_id, Phase::Judging).await;
    h.flow.run_judging(&debate.session_id).await.unwrap();

    assert_eq!(
        h.flow.run_judging(&debate.session_id).await.unwrap(),
        JudgingOutcome::Noop
    );
    let outcome = h
        .flow
        .try_advance(&debate.session_id, Phase::Concluded)
        .await
        .unwrap();
    assert!(!outcome.advanced());
    assert_eq!(h.responder.judge_calls(), 1);
}

#[tokio::test]
async fn abandoned_judgment_claim_is_taken_over() {
    let h = Harness::with(
        test_config().with_claim_ttl(Duration::from_millis(50)),
        ScriptedResponder::new(Some(2)),
    );
    let debate = in_opening(&h).await;
    advance_to(&h, &debate.session_id, Phase::Judging).await;

    // a judge that claimed and then died
    let claim = DispatchClaim {
        session_id: debate.session_id.clone(),
        phase: Phase::Judging,
        target: ClaimTarget::Judgment,
    };
    assert!(h.flow.store().claim_dispatch(&claim).await.unwrap().inserted());

    assert_eq!(
        h.flow.run_judging(&debate.session_id).await.unwrap(),
        JudgingOutcome::InFlight
    );
    assert_eq!(h.responder.judge_calls(), 0);

    tokio::time::sleep(Duration::from_millis(80)).await;
    let leader = h
        .flow
        .evaluate(&debate.session_id, debate.leader())
        .await
        .unwrap();
    assert_eq!(leader.state.phase, Phase::Concluded);
    assert_eq!(h.responder.judge_calls(), 1);
    assert!(h
        .flow
        .store()
        .load_judgment(&debate.session_id)
        .await
        .unwrap()
        .is_some());
}
