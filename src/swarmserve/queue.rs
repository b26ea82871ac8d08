//! Per-run event queue.
//!
//! An unbounded, thread-safe FIFO with exactly one producer (the run worker)
//! and any number of competing consumers (stream readers). `push` is
//! synchronous so the diagnostic sink can call it from inside the
//! orchestrator; `pop_timeout` yields cooperatively during its bounded wait
//! instead of spinning.

use crate::swarmserve::event::RunEvent;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};

#[derive(Default)]
pub struct EventQueue {
    items: Mutex<VecDeque<RunEvent>>,
    notify: Notify,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and wake every waiting consumer. Consumers race for
    /// the item; losers observe an empty queue and go back to waiting.
    pub fn push(&self, event: RunEvent) {
        self.items.lock().unwrap().push_back(event);
        self.notify.notify_waiters();
    }

    /// Pop the next event, waiting at most `wait`.
    ///
    /// The `Notified` future is created before the queue is checked, so a
    /// push landing between the check and the await is still observed —
    /// at worst after one timeout-driven re-check, never lost.
    pub async fn pop_timeout(&self, wait: Duration) -> Option<RunEvent> {
        let deadline = Instant::now() + wait;
        loop {
            let notified = self.notify.notified();
            if let Some(event) = self.items.lock().unwrap().pop_front() {
                return Some(event);
            }
            if timeout_at(deadline, notified).await.is_err() {
                return None;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}
