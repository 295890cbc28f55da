//! Session observer loop.
//!
//! One observer per connected participant. Each evaluates the session on
//! every change notification (stream mode) or poll tick, keeps its own phase
//! timer, and shares nothing with other observers except the store.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::config::debate::ObserverMode;
use crate::domain::ids::{ParticipantId, SessionId};
use crate::domain::session::SessionState;
use crate::domain::session_transition::derive_session_transitions;
use crate::repos::change_feed::ChangeEvent;
use crate::services::debate_flow::DebateFlowService;
use crate::services::timer::PhaseTimer;

pub struct SessionObserver {
    service: Arc<DebateFlowService>,
    session_id: SessionId,
    participant_id: ParticipantId,
    timer: PhaseTimer,
    last_seen: Option<SessionState>,
    cancel: CancellationToken,
}

impl SessionObserver {
    pub fn new(
        service: Arc<DebateFlowService>,
        session_id: SessionId,
        participant_id: ParticipantId,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            service,
            session_id,
            participant_id,
            timer: PhaseTimer::new(),
            last_seen: None,
            cancel,
        }
    }

    /// Run on the current runtime until cancelled or the session concludes.
    pub fn spawn(self) -> JoinHandle<()> {
        let span = tracing::info_span!(
            "observer",
            session_id = %self.session_id,
            participant_id = %self.participant_id
        );
        tokio::spawn(self.run().instrument(span))
    }

    /// Evaluate, then wait for the next notification, tick or deadline.
    pub async fn run(mut self) {
        let config = self.service.config().clone();
        let mut feed: Option<BoxStream<'static, ChangeEvent>> = match config.observer_mode {
            ObserverMode::Stream => Some(self.service.store().subscribe(&self.session_id)),
            ObserverMode::Poll => None,
        };
        let mut tick = tokio::time::interval(config.poll_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(mode = ?config.observer_mode, "Observer started");

        loop {
            if self.evaluate_once().await {
                info!("Session concluded, observer stopping");
                break;
            }

            let next_event = async {
                match feed.as_mut() {
                    Some(stream) => stream.next().await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Observer cancelled");
                    break;
                }
                event = next_event => {
                    match event {
                        Some(event) => debug!(event = ?event, "Change notification"),
                        None => {
                            warn!("Change feed closed, falling back to polling");
                            feed = None;
                        }
                    }
                }
                _ = tick.tick() => {}
                _ = self.timer.wait() => {
                    self.on_deadline().await;
                }
            }
        }
    }

    /// Returns true once the session is terminal.
    async fn evaluate_once(&mut self) -> bool {
        match self
            .service
            .evaluate(&self.session_id, &self.participant_id)
            .await
        {
            Ok(evaluation) => {
                self.timer.arm(&evaluation.state);
                if let Some(before) = self.last_seen.as_ref() {
                    for transition in derive_session_transitions(before, &evaluation.state) {
                        debug!(transition = ?transition, "Observed transition");
                    }
                }
                let terminal = evaluation.state.phase.is_terminal();
                self.last_seen = Some(evaluation.state);
                terminal
            }
            Err(e) => {
                // The next tick re-reads and tries again.
                warn!(error = %e, "Observer evaluation failed");
                false
            }
        }
    }

    async fn on_deadline(&mut self) {
        let Some(phase) = self.timer.take_expired(OffsetDateTime::now_utc()) else {
            return;
        };
        match self.service.try_advance(&self.session_id, phase).await {
            Ok(outcome) => debug!(phase = %phase, outcome = outcome.as_str(), "Deadline reached"),
            Err(e) => warn!(phase = %phase, error = %e, "Timed advance failed"),
        }
    }
}

/// Server-side observers, one per (session, participant).
#[derive(Default)]
pub struct ObserverRegistry {
    root: CancellationToken,
    running: parking_lot::Mutex<HashMap<(SessionId, ParticipantId), JoinHandle<()>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an observer unless one is already running for this pair.
    pub fn ensure(
        &self,
        service: &Arc<DebateFlowService>,
        session_id: &SessionId,
        participant_id: &ParticipantId,
    ) -> bool {
        let mut running = self.running.lock();
        running.retain(|_, handle| !handle.is_finished());
        let key = (session_id.clone(), participant_id.clone());
        if running.contains_key(&key) {
            return false;
        }
        let handle = SessionObserver::new(
            Arc::clone(service),
            session_id.clone(),
            participant_id.clone(),
            self.root.child_token(),
        )
        .spawn();
        running.insert(key, handle);
        true
    }

    pub fn len(&self) -> usize {
        self.running
            .lock()
            .values()
            .filter(|h| !h.is_finished())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancel every observer.
    pub fn shutdown(&self) {
        self.root.cancel();
    }
}
