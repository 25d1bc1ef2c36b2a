use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const EVENT_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TimerEvent {
    Tick { remaining_secs: u64 },
    Expired,
}

/// Pure countdown state. Each `tick` removes one second; reaching zero yields
/// `Expired` once and disarms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining_secs: u64,
    armed: bool,
}

impl Countdown {
    #[must_use]
    pub fn new(duration_secs: u64) -> Self {
        Self {
            remaining_secs: duration_secs,
            armed: true,
        }
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.armed {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.armed = false;
            Some(TimerEvent::Expired)
        } else {
            Some(TimerEvent::Tick {
                remaining_secs: self.remaining_secs,
            })
        }
    }
}

/// Countdown running on a tokio task.
///
/// Events arrive through `next_event`. The task is aborted by `disarm` and on
/// drop; no event is delivered after either.
#[derive(Debug)]
pub struct CountdownTimer {
    events: mpsc::Receiver<TimerEvent>,
    handle: JoinHandle<()>,
    disarmed: bool,
}

impl CountdownTimer {
    /// Start counting down from `duration_secs`, one second per `tick`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start(duration_secs: u64, tick: Duration) -> Self {
        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let handle = tokio::spawn(async move {
            let mut countdown = Countdown::new(duration_secs);
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(event) = countdown.tick() else {
                    break;
                };
                if tx.send(event).await.is_err() {
                    tracing::debug!("countdown receiver dropped");
                    break;
                }
                if event == TimerEvent::Expired {
                    tracing::debug!("countdown expired");
                    break;
                }
            }
        });

        Self {
            events,
            handle,
            disarmed: false,
        }
    }

    /// Next countdown event, or `None` once expired or disarmed.
    pub async fn next_event(&mut self) -> Option<TimerEvent> {
        if self.disarmed {
            return None;
        }
        self.events.recv().await
    }

    pub fn disarm(&mut self) {
        if !self.disarmed {
            self.disarmed = true;
            self.handle.abort();
            self.events.close();
        }
    }

    #[must_use]
    pub fn is_disarmed(&self) -> bool {
        self.disarmed
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
