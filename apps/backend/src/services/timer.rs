//! Per-observer phase countdown.
//!
//! Armed from the coordination record's deadline; fires at most once per
//! (phase, deadline). Firing only requests a transition; the conditional
//! write decides.

use std::time::Duration;

use time::OffsetDateTime;

use crate::domain::phase::Phase;
use crate::domain::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Armed {
    phase: Phase,
    deadline: OffsetDateTime,
    fired: bool,
}

#[derive(Debug, Default)]
pub struct PhaseTimer {
    armed: Option<Armed>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `state`'s deadline. Re-arming with the same phase and deadline
    /// keeps the fired flag.
    pub fn arm(&mut self, state: &SessionState) {
        let Some(deadline) = state.timer_deadline else {
            self.armed = None;
            return;
        };
        let same = self
            .armed
            .is_some_and(|a| a.phase == state.phase && a.deadline == deadline);
        if !same {
            self.armed = Some(Armed {
                phase: state.phase,
                deadline,
                fired: false,
            });
        }
    }

    /// Time left, or `None` when disarmed or already fired.
    pub fn remaining(&self, now: OffsetDateTime) -> Option<Duration> {
        let armed = self.armed.filter(|a| !a.fired)?;
        let left = armed.deadline - now;
        Some(if left.is_positive() {
            left.unsigned_abs()
        } else {
            Duration::ZERO
        })
    }

    /// The armed phase, exactly once, once the deadline has passed.
    pub fn take_expired(&mut self, now: OffsetDateTime) -> Option<Phase> {
        let armed = self.armed.as_mut()?;
        if armed.fired || now < armed.deadline {
            return None;
        }
        armed.fired = true;
        Some(armed.phase)
    }

    /// Sleeps until the deadline; pends forever when nothing is armed.
    pub async fn wait(&self) {
        match self.remaining(OffsetDateTime::now_utc()) {
            Some(left) => tokio::time::sleep(left).await,
            None => std::future::pending::<()>().await,
        }
    }
}
