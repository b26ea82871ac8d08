//! Per-run shared state.

use crate::swarmserve::model::RunResponse;
use crate::swarmserve::queue::EventQueue;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Capacity of the log-tail ring. A debugging aid, not a correctness
/// mechanism: lines beyond capacity are silently dropped, oldest first.
pub const LOG_TAIL_CAPACITY: usize = 256;

/// Everything the service tracks for one run.
///
/// Mutated only by the run's own worker (queue pushes, log ring appends, the
/// completion flag, the summary slot) and read concurrently by any number of
/// stream readers and polling callers. The completion flag transitions
/// false→true exactly once, strictly *after* the terminal event has been
/// enqueued and the summary slot populated — consumers must drain the queue
/// to empty before trusting it.
pub struct RunContext {
    pub queue: EventQueue,
    done: AtomicBool,
    summary: Mutex<Option<RunResponse>>,
    log_tail: Mutex<VecDeque<String>>,
    created_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            queue: EventQueue::new(),
            done: AtomicBool::new(false),
            summary: Mutex::new(None),
            log_tail: Mutex::new(VecDeque::new()),
            created_at: Utc::now(),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Publish completion. Must be the worker's last action, after the
    /// terminal enqueue and the summary store.
    pub fn mark_done(&self) {
        self.done.store(true, Ordering::Release);
    }

    pub fn store_summary(&self, summary: RunResponse) {
        *self.summary.lock().unwrap() = Some(summary);
    }

    pub fn summary(&self) -> Option<RunResponse> {
        self.summary.lock().unwrap().clone()
    }

    /// Append one log line, evicting the oldest beyond capacity.
    pub fn push_log(&self, line: String) {
        let mut tail = self.log_tail.lock().unwrap();
        if tail.len() == LOG_TAIL_CAPACITY {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    /// The most recent `max_lines` buffered log lines, oldest first.
    pub fn log_tail(&self, max_lines: usize) -> Vec<String> {
        let tail = self.log_tail.lock().unwrap();
        let skip = tail.len().saturating_sub(max_lines);
        tail.iter().skip(skip).cloned().collect()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
