// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for sharing one `TimerQueue` between a debouncer and other timers.
//!
//! This mirrors how an event loop uses the crate: several kinds of task live in one
//! queue and the host drains them in deadline order.

use understory_timing::{Debouncer, TimerQueue};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Task {
    Flush,
    Tick(u32),
}

#[test]
fn flush_interleaves_with_other_tasks_in_deadline_order() {
    let mut timers = TimerQueue::new();
    let mut debounce = Debouncer::new(30);

    timers.schedule(10, Task::Tick(1));
    debounce.call(&mut timers, 0, "first", Task::Flush);
    timers.schedule(40, Task::Tick(2));

    let mut log = Vec::new();
    while let Some((key, task)) = timers.pop_due(100) {
        match task {
            Task::Flush => log.push(debounce.fire(key).unwrap_or("stale")),
            Task::Tick(1) => log.push("tick1"),
            Task::Tick(_) => log.push("tick2"),
        }
    }
    assert_eq!(log, ["tick1", "first", "tick2"]);
}

#[test]
fn call_from_inside_a_drain_pass_is_seen_in_the_same_pass() {
    let mut timers = TimerQueue::new();
    let mut debounce = Debouncer::new(0);
    timers.schedule(5, Task::Tick(0));

    let mut delivered = Vec::new();
    while let Some((key, task)) = timers.pop_due(5) {
        match task {
            Task::Tick(_) => {
                debounce.call(&mut timers, key.deadline(), "from-timer", Task::Flush);
            }
            Task::Flush => delivered.extend(debounce.fire(key)),
        }
    }
    assert_eq!(delivered, ["from-timer"]);
    assert!(timers.is_empty());
}

#[test]
fn cancelling_debouncer_leaves_other_tasks() {
    let mut timers = TimerQueue::new();
    let mut debounce = Debouncer::new(10);
    debounce.call(&mut timers, 0, 1_u8, Task::Flush);
    timers.schedule(20, Task::Tick(3));

    debounce.cancel(&mut timers);
    assert_eq!(timers.len(), 1);
    assert_eq!(timers.next_deadline(), Some(20));
}
