//! Session fixtures on the in-memory store with the scripted generator.

use std::sync::Arc;
use std::time::Duration;

use backend::ai::ScriptedResponder;
use backend::config::debate::DebateConfig;
use backend::domain::ids::{ParticipantId, SessionId};
use backend::domain::phase::Phase;
use backend::domain::roster::Role;
use backend::domain::session::{SessionState, Submission};
use backend::repos::memory::InMemorySessionStore;
use backend::services::debate_flow::{
    automated_participant_ids, AdvanceOutcome, DebateFlowService, DispatchOutcome, RoleOutcome,
    StartOutcome, SubmitOutcome,
};

/// Conflict bound used throughout the suites.
pub const TEST_CONFLICT_BOUND: u32 = 3;

pub fn test_config() -> DebateConfig {
    DebateConfig::default()
        .with_role_conflict_bound(TEST_CONFLICT_BOUND)
        .with_generator_timeout(Duration::from_secs(2))
        .with_poll_interval(Duration::from_millis(20))
}

pub struct Harness {
    pub flow: Arc<DebateFlowService>,
    pub responder: Arc<ScriptedResponder>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(test_config(), ScriptedResponder::new(Some(7)))
    }

    pub fn with_responder(responder: ScriptedResponder) -> Self {
        Self::with(test_config(), responder)
    }

    pub fn with(config: DebateConfig, responder: ScriptedResponder) -> Self {
        let responder = Arc::new(responder);
        let flow = DebateFlowService::new(
            Arc::new(InMemorySessionStore::new()),
            responder.clone(),
            config,
        )
        .with_seed(11);
        Self {
            flow: Arc::new(flow),
            responder,
        }
    }

    pub async fn state(&self, session_id: &SessionId) -> SessionState {
        self.flow
            .store()
            .load_state(session_id)
            .await
            .expect("load state")
    }

    pub async fn submissions(&self, session_id: &SessionId) -> Vec<Submission> {
        self.flow
            .store()
            .load_submissions(session_id)
            .await
            .expect("load submissions")
    }
}

/// A session with both human seats taken.
#[derive(Debug, Clone)]
pub struct Debate {
    pub session_id: SessionId,
    pub first: ParticipantId,
    pub second: ParticipantId,
}

impl Debate {
    /// The observer that wins leader election.
    pub fn leader(&self) -> &ParticipantId {
        std::cmp::min(&self.first, &self.second)
    }

    pub fn follower(&self) -> &ParticipantId {
        std::cmp::max(&self.first, &self.second)
    }

    /// Automated participants; the first debates pro, the second con.
    pub fn automated(&self) -> [ParticipantId; 2] {
        automated_participant_ids(&self.session_id)
    }
}

pub async fn seated(h: &Harness) -> Debate {
    let session = h.flow.create_session("Lunch debate").await.expect("create");
    let first = h
        .flow
        .join_session(&session.id, "Alice")
        .await
        .expect("join first");
    let second = h
        .flow
        .join_session(&session.id, "Bob")
        .await
        .expect("join second");
    Debate {
        session_id: session.id,
        first: first.id,
        second: second.id,
    }
}

/// Seated and in role selection.
pub async fn started(h: &Harness) -> Debate {
    let debate = seated(h).await;
    let outcome = h
        .flow
        .start_session(&debate.session_id)
        .await
        .expect("start");
    assert!(matches!(outcome, StartOutcome::Started(_)));
    debate
}

/// In the opening phase with `first` on pro and `second` on con.
pub async fn in_opening(h: &Harness) -> Debate {
    let debate = started(h).await;
    let waiting = h
        .flow
        .select_role(&debate.session_id, &debate.first, Role::Pro)
        .await
        .expect("first pick");
    assert_eq!(waiting, RoleOutcome::Waiting);
    let started = h
        .flow
        .select_role(&debate.session_id, &debate.second, Role::Con)
        .await
        .expect("second pick");
    assert_eq!(started, RoleOutcome::Started);
    debate
}

/// Timer-advance from the current phase until `target` is reached.
pub async fn advance_to(h: &Harness, session_id: &SessionId, target: Phase) {
    loop {
        let phase = h.state(session_id).await.phase;
        if phase == target {
            return;
        }
        assert!(phase < target, "already past {target}");
        let outcome = h.flow.try_advance(session_id, phase).await.expect("advance");
        assert!(outcome.advanced(), "timer advance from {phase} should win");
    }
}

pub async fn submit_human(
    h: &Harness,
    debate: &Debate,
    who: &ParticipantId,
    content: &str,
) -> SubmitOutcome {
    let phase = h.state(&debate.session_id).await.phase;
    h.flow
        .submit(&debate.session_id, who, content, Some(phase))
        .await
        .expect("submit")
}

pub async fn produce(h: &Harness, debate: &Debate, target: &ParticipantId) -> DispatchOutcome {
    let phase = h.state(&debate.session_id).await.phase;
    h.flow
        .produce_automated_turn(&debate.session_id, phase, target)
        .await
        .expect("produce")
}

/// Poll until the session reaches `phase`, or panic after `within`.
pub async fn wait_for_phase(
    h: &Harness,
    session_id: &SessionId,
    phase: Phase,
    within: Duration,
) -> SessionState {
    let deadline = tokio::time::Instant::now() + within;
    loop {
        let state = h.state(session_id).await;
        if state.phase == phase {
            return state;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "session stuck in {} waiting for {phase}",
            state.phase
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn count_advanced<'a>(outcomes: impl IntoIterator<Item = &'a AdvanceOutcome>) -> usize {
    outcomes.into_iter().filter(|o| o.advanced()).count()
}
