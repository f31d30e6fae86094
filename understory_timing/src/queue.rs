// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timer queue: pending tasks ordered by deadline, then by scheduling order.

use alloc::collections::BTreeMap;

/// Handle to a scheduled task.
///
/// A key is unique for the lifetime of its [`TimerQueue`]: sequence numbers are
/// never reused, so a stale key can never cancel a newer task.
///
/// Keys order by deadline first and scheduling sequence second, which is exactly
/// the order in which [`TimerQueue::pop_due`] yields them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerKey {
    deadline: u64,
    seq: u64,
}

impl TimerKey {
    /// The instant (host milliseconds) at which this task becomes due.
    #[must_use]
    pub const fn deadline(self) -> u64 {
        self.deadline
    }
}

/// Pending tasks keyed by deadline.
///
/// The queue is passive: nothing fires on its own. The host advances its clock and
/// repeatedly calls [`pop_due`](Self::pop_due) until it returns `None`.
///
/// ```
/// use understory_timing::TimerQueue;
///
/// let mut q = TimerQueue::new();
/// let late = q.schedule(50, "late");
/// let _early = q.schedule(10, "early");
/// q.cancel(late);
///
/// assert_eq!(q.next_deadline(), Some(10));
/// assert_eq!(q.pop_due(10).map(|(_, t)| t), Some("early"));
/// assert!(q.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct TimerQueue<T> {
    pending: BTreeMap<TimerKey, T>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Schedules `task` to become due at `deadline`.
    pub fn schedule(&mut self, deadline: u64, task: T) -> TimerKey {
        let key = TimerKey {
            deadline,
            seq: self.next_seq,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        self.pending.insert(key, task);
        key
    }

    /// Schedules `task` to become due `delay` milliseconds after `now`.
    pub fn schedule_after(&mut self, now: u64, delay: u64, task: T) -> TimerKey {
        self.schedule(now.saturating_add(delay), task)
    }

    /// Cancels a pending task, returning it if it had not fired yet.
    ///
    /// Cancelling an already fired or already cancelled key is a no-op.
    pub fn cancel(&mut self, key: TimerKey) -> Option<T> {
        self.pending.remove(&key)
    }

    /// Returns `true` if `key` is still pending.
    #[must_use]
    pub fn contains(&self, key: TimerKey) -> bool {
        self.pending.contains_key(&key)
    }

    /// Returns the earliest pending deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|k| k.deadline)
    }

    /// Removes and returns the earliest task whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<(TimerKey, T)> {
        let first = *self.pending.keys().next()?;
        if first.deadline > now {
            return None;
        }
        self.pending.remove_entry(&first)
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every pending task.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
