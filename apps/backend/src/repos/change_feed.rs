//! In-process change notifications keyed by session.
//!
//! Best-effort: slow subscribers that lag behind the channel capacity skip
//! events and are expected to re-read (or fall back to polling).

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::domain::ids::SessionId;

const FEED_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    StateChanged { session_id: SessionId, version: i32 },
    RosterChanged { session_id: SessionId },
    SubmissionAdded { session_id: SessionId },
    JudgmentRecorded { session_id: SessionId },
}

impl ChangeEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            ChangeEvent::StateChanged { session_id, .. }
            | ChangeEvent::RosterChanged { session_id }
            | ChangeEvent::SubmissionAdded { session_id }
            | ChangeEvent::JudgmentRecorded { session_id } => session_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    /// Publish after a successful write. No subscribers is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!(session_id = %event.session_id(), "No change subscribers");
        }
    }

    /// Events for one session. Lagged gaps are dropped silently.
    pub fn subscribe(&self, session_id: &SessionId) -> BoxStream<'static, ChangeEvent> {
        let wanted = session_id.clone();
        BroadcastStream::new(self.sender.subscribe())
            .filter_map(move |item| {
                let wanted = wanted.clone();
                async move {
                    match item {
                        Ok(event) if event.session_id() == &wanted => Some(event),
                        _ => None,
                    }
                }
            })
            .boxed()
    }
}
