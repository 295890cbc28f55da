use std::sync::Arc;
use std::time::Duration;

use backend::ai::ScriptedResponder;
use backend::domain::phase::Phase;
use backend::errors::ErrorCode;
use backend::repos::session_store::{ClaimTarget, DispatchClaim};
use backend::services::debate_flow::{AdvanceOutcome, DebateFlowService, DispatchOutcome};

use crate::support::debate_setup::{advance_to, in_opening, test_config, Harness};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_call_the_generator_once() {
    let h = Harness::with_responder(
        ScriptedResponder::new(Some(1)).with_delay(Duration::from_millis(50)),
    );
    let debate = in_opening(&h).await;
    let [bot_pro, _] = debate.automated();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let flow = h.flow.clone();
        let id = debate.session_id.clone();
        let target = bot_pro.clone();
        tasks.push(tokio::spawn(async move {
            flow.produce_automated_turn(&id, Phase::OpeningClaim, &target)
                .await
        }));
    }
    let mut produced = 0;
    for task in tasks {
        match task.await.expect("join").expect("produce") {
            DispatchOutcome::Produced { .. } => produced += 1,
            DispatchOutcome::InFlight | DispatchOutcome::AlreadyProduced => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    assert_eq!(produced, 1);
    assert_eq!(h.responder.statement_calls(), 1);
    let from_bot = h
        .submissions(&debate.session_id)
        .await
        .into_iter()
        .filter(|s| s.participant_id == bot_pro)
        .count();
    assert_eq!(from_bot, 1);
}

#[tokio::test]
async fn only_the_leader_dispatches() {
    let h = Harness::new();
    let debate = in_opening(&h).await;

    let follower = h
        .flow
        .dispatch_automated_turns(&debate.session_id, debate.follower())
        .await
        .unwrap();
    assert!(follower.is_empty());
    assert_eq!(h.responder.statement_calls(), 0);

    let leader = h
        .flow
        .dispatch_automated_turns(&debate.session_id, debate.leader())
        .await
        .unwrap();
    assert_eq!(leader.len(), 2);
    assert!(leader
        .iter()
        .all(|o| matches!(o, DispatchOutcome::Produced { advance: AdvanceOutcome::Noop })));
    assert_eq!(h.responder.statement_calls(), 2);

    // nothing left to produce
    let again = h
        .flow
        .dispatch_automated_turns(&debate.session_id, debate.leader())
        .await
        .unwrap();
    assert!(again.is_empty());
    assert_eq!(h.responder.statement_calls(), 2);
}

#[tokio::test]
async fn automated_turn_phase_advances_on_production() {
    let h = Harness::new();
    let debate = in_opening(&h).await;
    advance_to(&h, &debate.session_id, Phase::Cycle3ProAiRebuttal).await;

    let outcomes = h
        .flow
        .dispatch_automated_turns(&debate.session_id, debate.leader())
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    match &outcomes[0] {
        DispatchOutcome::Produced {
            advance: AdvanceOutcome::Advanced(state),
        } => assert_eq!(state.phase, Phase::Cycle3ConDefense),
        other => panic!("unexpected {other:?}"),
    }

    let [bot_pro, _] = debate.automated();
    let statement = h
        .submissions(&debate.session_id)
        .await
        .into_iter()
        .find(|s| s.participant_id == bot_pro)
        .expect("automated rebuttal");
    assert_eq!(statement.phase, Phase::Cycle3ProAiRebuttal);
    assert!(statement.content.starts_with("[pro]"));
}

#[tokio::test]
async fn generator_failure_defers_and_releases_the_claim() {
    let h = Harness::with_responder(ScriptedResponder::new(Some(1)).failing_statements());
    let debate = in_opening(&h).await;

    let outcomes = h
        .flow
        .dispatch_automated_turns(&debate.session_id, debate.leader())
        .await
        .unwrap();
    assert_eq!(
        outcomes,
        vec![DispatchOutcome::Deferred, DispatchOutcome::Deferred]
    );
    assert!(h.submissions(&debate.session_id).await.is_empty());

    // released claims let the next tick try again
    h.flow
        .dispatch_automated_turns(&debate.session_id, debate.leader())
        .await
        .unwrap();
    assert_eq!(h.responder.statement_calls(), 4);

    let [bot_pro, _] = debate.automated();
    let err = h
        .flow
        .produce_automated_turn(&debate.session_id, Phase::OpeningClaim, &bot_pro)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::GeneratorUnavailable);
    assert_eq!(h.state(&debate.session_id).await.phase, Phase::OpeningClaim);
}

#[tokio::test]
async fn slow_generator_times_out() {
    let h = Harness::new();
    let debate = in_opening(&h).await;
    let [bot_pro, _] = debate.automated();

    // a stalling generator on the same store
    let stalled = DebateFlowService::new(
        h.flow.store().clone(),
        Arc::new(ScriptedResponder::new(Some(1)).with_delay(Duration::from_millis(500))),
        test_config().with_generator_timeout(Duration::from_millis(20)),
    );
    let err = stalled
        .produce_automated_turn(&debate.session_id, Phase::OpeningClaim, &bot_pro)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::GeneratorTimeout);

    // the claim was released, so a healthy generator can produce it
    let outcome = h
        .flow
        .produce_automated_turn(&debate.session_id, Phase::OpeningClaim, &bot_pro)
        .await
        .unwrap();
    assert!(matches!(outcome, DispatchOutcome::Produced { .. }));
}

#[tokio::test]
async fn production_outside_its_phase_is_rejected_or_closed() {
    let h = Harness::new();
    let debate = in_opening(&h).await;
    let [bot_pro, _] = debate.automated();

    let closed = h
        .flow
        .produce_automated_turn(&debate.session_id, Phase::ClosingStatement, &bot_pro)
        .await
        .unwrap();
    assert_eq!(closed, DispatchOutcome::PhaseClosed);

    let human = h
        .flow
        .produce_automated_turn(&debate.session_id, Phase::OpeningClaim, &debate.first)
        .await
        .unwrap_err();
    assert_eq!(human.code(), ErrorCode::NotRequiredSubmitter);

    // the con bot has no turn in the pro-only automated rebuttal
    advance_to(&h, &debate.session_id, Phase::Cycle3ProAiRebuttal).await;
    let [_, bot_con] = debate.automated();
    let off_turn = h
        .flow
        .produce_automated_turn(&debate.session_id, Phase::Cycle3ProAiRebuttal, &bot_con)
        .await
        .unwrap_err();
    assert_eq!(off_turn.code(), ErrorCode::NotRequiredSubmitter);
    assert_eq!(h.responder.statement_calls(), 0);
}

#[tokio::test]
async fn stale_turn_claim_is_taken_over() {
    let h = Harness::with(
        test_config().with_claim_ttl(Duration::from_millis(50)),
        ScriptedResponder::new(Some(1)),
    );
    let debate = in_opening(&h).await;
    let [bot_pro, _] = debate.automated();
    let claim = DispatchClaim {
        session_id: debate.session_id.clone(),
        phase: Phase::OpeningClaim,
        target: ClaimTarget::Participant(bot_pro.clone()),
    };
    h.flow.store().claim_dispatch(&claim).await.unwrap();

    let fresh = h
        .flow
        .produce_automated_turn(&debate.session_id, Phase::OpeningClaim, &bot_pro)
        .await
        .unwrap();
    assert_eq!(fresh, DispatchOutcome::InFlight);

    tokio::time::sleep(Duration::from_millis(80)).await;
    let taken_over = h
        .flow
        .produce_automated_turn(&debate.session_id, Phase::OpeningClaim, &bot_pro)
        .await
        .unwrap();
    assert!(matches!(taken_over, DispatchOutcome::Produced { .. }), "{taken_over:?}");
    assert_eq!(h.responder.statement_calls(), 1);
}
