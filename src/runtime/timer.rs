//! Deadline-ordered timer (macrotask) queue.

use std::collections::BTreeMap;

use super::queue::Task;

/// Identifier returned when a timer is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Pending timers keyed by (deadline, registration order)
#[derive(Default)]
pub struct TimerQueue {
    timers: BTreeMap<(u64, u64), Task>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run once the clock reaches `deadline_ms`
    pub fn schedule(&mut self, deadline_ms: u64, task: Task) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.insert((deadline_ms, seq), task);
        TimerId(seq)
    }

    /// Earliest deadline among pending timers
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove the earliest timer whose deadline is at or before `now_ms`.
    /// Timers sharing a deadline come out in registration order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Task> {
        let key = *self.timers.keys().next()?;
        if key.0 > now_ms {
            return None;
        }
        self.timers.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl std::fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("pending", &self.timers.len())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}
