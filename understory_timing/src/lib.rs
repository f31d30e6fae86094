// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_timing --heading-base-level=0

//! Understory Timing: deterministic timers and debouncing for host-driven event loops.
//!
//! This crate does not read a clock and does not spawn anything. The host owns time:
//! it passes a monotonic millisecond timestamp into every call, and pulls due work
//! out of a [`TimerQueue`] when it decides to run its loop. That keeps timer-driven
//! UI behavior reproducible in tests and usable from `no_std` targets.
//!
//! - [`TimerQueue`]: an ordered set of pending tasks keyed by deadline. Tasks due at
//!   the same instant fire in the order they were scheduled.
//! - [`TimerKey`]: the handle returned on scheduling; use it to cancel.
//! - [`Debouncer`]: trailing-edge coalescing on top of a shared queue. Only the most
//!   recent call within the quiet window is ever delivered.
//!
//! ## Minimal example
//!
//! ```
//! use understory_timing::{Debouncer, TimerQueue};
//!
//! #[derive(Debug, PartialEq)]
//! enum Task { Flush }
//!
//! let mut timers = TimerQueue::new();
//! let mut debounce = Debouncer::new(100);
//!
//! // A burst of calls inside the window.
//! debounce.call(&mut timers, 0, "a", Task::Flush);
//! debounce.call(&mut timers, 40, "b", Task::Flush);
//! debounce.call(&mut timers, 90, "c", Task::Flush);
//!
//! // Nothing is due until 100 ms after the last call.
//! assert!(timers.pop_due(150).is_none());
//! let (key, task) = timers.pop_due(190).unwrap();
//! assert_eq!(task, Task::Flush);
//! assert_eq!(debounce.fire(key), Some("c"));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod debounce;
mod queue;

pub use debounce::Debouncer;
pub use queue::{TimerKey, TimerQueue};
