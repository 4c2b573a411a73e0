#![forbid(unsafe_code)]

//! Virtual-time timer queue.
//!
//! Time only moves when the host calls [`TimerQueue::pop_due`] with a later
//! instant (the [`Document`](crate::Document) wraps this as `advance`). This
//! keeps deferred work deterministic in tests and lets an embedding drive the
//! queue from its own clock.
//!
//! # Invariants
//!
//! - Due timers are released in `(deadline, scheduling order)` order.
//! - `now()` never decreases.
//! - A cancelled timer is never released.

use std::fmt;
use std::time::Duration;

/// Handle for a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Boxed timer callback.
pub type TimerCallback = Box<dyn FnOnce()>;

struct PendingTimer {
    id: TimerId,
    deadline: Duration,
    callback: TimerCallback,
}

/// Pending callbacks ordered by virtual deadline.
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerQueue")
            .field("now", &self.now)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    /// Current virtual time since the queue was created.
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of timers not yet released.
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedule `callback` to become due `delay` after now.
    pub fn schedule(&mut self, delay: Duration, callback: TimerCallback) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingTimer {
            id,
            deadline: self.now.saturating_add(delay),
            callback,
        });
        id
    }

    /// Cancel a pending timer. Returns `false` if it already ran or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.pending.iter().position(|t| t.id == id) {
            Some(idx) => {
                self.pending.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|t| t.id == id)
    }

    /// Release the earliest timer due at or before `until`, moving `now` to
    /// its deadline. Returns `None` (and moves `now` to `until`) when nothing
    /// is due.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerCallback> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= until)
            .min_by_key(|(_, t)| (t.deadline, t.id))
            .map(|(idx, _)| idx);

        match idx {
            Some(idx) => {
                let timer = self.pending.remove(idx);
                self.now = self.now.max(timer.deadline);
                Some(timer.callback)
            }
            None => {
                self.now = self.now.max(until);
                None
            }
        }
    }
}
