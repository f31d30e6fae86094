// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debouncer: trailing-edge coalescing over a shared [`TimerQueue`].
//!
//! ## Usage
//!
//! 1) Call [`Debouncer::call`] for every input. Each call cancels the flush task
//!    scheduled by the previous one and schedules a new flush `wait` ms later.
//! 2) When the host pops a flush task from the queue, pass its key to
//!    [`Debouncer::fire`] to receive the arguments of the most recent call.
//! 3) [`Debouncer::cancel`] drops whatever is pending.
//!
//! There is no leading-edge delivery and no queueing: arguments of superseded
//! calls are dropped. A `wait` of `0` schedules the flush at the call instant, so
//! it is delivered on the host's next pass over the queue, never synchronously.

use crate::queue::{TimerKey, TimerQueue};

/// Trailing-edge debouncer carrying the arguments of the latest call.
#[derive(Clone, Debug)]
pub struct Debouncer<A> {
    wait: u64,
    pending: Option<(TimerKey, A)>,
}

impl<A> Debouncer<A> {
    /// Creates a debouncer with a quiet window of `wait` milliseconds.
    #[must_use]
    pub const fn new(wait: u64) -> Self {
        Self {
            wait,
            pending: None,
        }
    }

    /// The quiet window in milliseconds.
    #[must_use]
    pub const fn wait(&self) -> u64 {
        self.wait
    }

    /// Records a call made at `now`.
    ///
    /// Any pending flush is cancelled and `task` is scheduled on `timers` at
    /// `now + wait`; the returned key identifies that flush.
    pub fn call<T>(
        &mut self,
        timers: &mut TimerQueue<T>,
        now: u64,
        args: A,
        task: T,
    ) -> TimerKey {
        if let Some((key, _)) = self.pending.take() {
            timers.cancel(key);
        }
        let key = timers.schedule_after(now, self.wait, task);
        self.pending = Some((key, args));
        key
    }

    /// Takes the pending arguments if `key` is the flush currently armed.
    ///
    /// Returns `None` for keys of superseded or cancelled flushes.
    pub fn fire(&mut self, key: TimerKey) -> Option<A> {
        match self.pending.take() {
            Some((pending, args)) if pending == key => Some(args),
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// Cancels the pending flush, if any, and drops its arguments.
    pub fn cancel<T>(&mut self, timers: &mut TimerQueue<T>) {
        if let Some((key, _)) = self.pending.take() {
            timers.cancel(key);
        }
    }

    /// Returns `true` while a flush is armed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Arguments that the armed flush would deliver.
    #[must_use]
    pub fn peek(&self) -> Option<&A> {
        self.pending.as_ref().map(|(_, args)| args)
    }
}
