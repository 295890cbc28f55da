use backend::ai::ScriptedResponder;
use backend::domain::phase::Phase;
use backend::domain::session::SessionStatus;
use backend::domain::topics::FALLBACK_TOPICS;
use backend::errors::ErrorCode;
use backend::services::debate_flow::StartOutcome;

use crate::support::debate_setup::{in_opening, seated, started, Harness};

#[tokio::test]
async fn new_session_is_forming_and_empty() {
    let h = Harness::new();
    let session = h.flow.create_session("  Friday debate ").await.unwrap();
    assert_eq!(session.name, "Friday debate");
    assert_eq!(session.status, SessionStatus::Forming);

    let snapshot = h.flow.store().load_snapshot(&session.id).await.unwrap();
    assert_eq!(snapshot.state.phase, Phase::Forming);
    assert_eq!(snapshot.state.version, 1);
    assert!(snapshot.roster.is_empty());
    assert!(snapshot.judgment.is_none());

    let err = h.flow.create_session("   ").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[tokio::test]
async fn joining_fills_two_human_seats() {
    let h = Harness::new();
    let debate = seated(&h).await;

    let full = h
        .flow
        .join_session(&debate.session_id, "Carol")
        .await
        .unwrap_err();
    assert_eq!(full.code(), ErrorCode::ValidationError);

    let blank = h
        .flow
        .join_session(&debate.session_id, " ")
        .await
        .unwrap_err();
    assert_eq!(blank.code(), ErrorCode::MissingIdentity);
}

#[tokio::test]
async fn joining_closes_once_started() {
    let h = Harness::new();
    let debate = started(&h).await;
    let err = h
        .flow
        .join_session(&debate.session_id, "Latecomer")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPhase);
}

#[tokio::test]
async fn start_waits_for_two_humans() {
    let h = Harness::new();
    let session = h.flow.create_session("Solo").await.unwrap();
    h.flow.join_session(&session.id, "Alice").await.unwrap();

    let outcome = h.flow.start_session(&session.id).await.unwrap();
    assert_eq!(outcome, StartOutcome::NotReady);
    assert_eq!(h.responder.topic_calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_provision_once() {
    let h = Harness::new();
    let debate = seated(&h).await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let flow = h.flow.clone();
        let id = debate.session_id.clone();
        tasks.push(tokio::spawn(async move { flow.start_session(&id).await }));
    }
    let mut started = 0;
    for task in tasks {
        match task.await.expect("join").unwrap() {
            StartOutcome::Started(state) => {
                started += 1;
                assert_eq!(state.phase, Phase::RoleSelection);
            }
            StartOutcome::Noop => {}
            StartOutcome::NotReady => panic!("both seats are taken"),
        }
    }
    assert_eq!(started, 1);

    let roster = h
        .flow
        .store()
        .load_roster(&debate.session_id)
        .await
        .unwrap();
    assert_eq!(roster.len(), 4);
    let mut bots: Vec<_> = roster
        .iter()
        .filter(|p| p.is_automated)
        .map(|p| p.id.clone())
        .collect();
    bots.sort();
    assert_eq!(bots, debate.automated().to_vec());

    let session = h.flow.store().load_session(&debate.session_id).await.unwrap();
    assert_eq!(session.status, SessionStatus::Active);
}

#[tokio::test]
async fn start_falls_back_to_a_static_topic() {
    let h = Harness::with_responder(ScriptedResponder::new(Some(5)).failing_topics());
    let debate = started(&h).await;

    let state = h.state(&debate.session_id).await;
    let topic = state.topic.expect("topic set");
    assert!(FALLBACK_TOPICS.contains(&topic.as_str()));
    assert_eq!(state.topic_conflict_count, 0);
    assert_eq!(h.responder.topic_calls(), 1);
}

#[tokio::test]
async fn start_after_start_is_a_noop() {
    let h = Harness::new();
    let debate = in_opening(&h).await;
    let outcome = h.flow.start_session(&debate.session_id).await.unwrap();
    assert_eq!(outcome, StartOutcome::Noop);
}
