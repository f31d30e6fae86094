// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debounce basics.
//!
//! Drive a `Debouncer` and a periodic task from one `TimerQueue`, the way a host
//! event loop would.
//!
//! Run:
//! - `cargo run -p understory_examples --example debounce_basics`

use understory_timing::{Debouncer, TimerQueue};

#[derive(Debug)]
enum Task {
    Flush,
    Heartbeat,
}

fn main() {
    let mut timers = TimerQueue::new();
    let mut search = Debouncer::new(150);
    timers.schedule(0, Task::Heartbeat);

    // Keystrokes: a burst, a pause, then one more.
    let typed = [(0, "r"), (60, "ru"), (120, "rus"), (400, "rust")];
    let mut input = typed.iter().peekable();

    for now in (0..=800).step_by(10) {
        while let Some(&&(at, text)) = input.peek() {
            if at > now {
                break;
            }
            search.call(&mut timers, at, text, Task::Flush);
            input.next();
        }
        while let Some((key, task)) = timers.pop_due(now) {
            match task {
                Task::Flush => {
                    if let Some(query) = search.fire(key) {
                        println!("t={now:>3}  search {query:?}");
                    }
                }
                Task::Heartbeat => {
                    println!("t={now:>3}  heartbeat");
                    timers.schedule_after(key.deadline(), 250, Task::Heartbeat);
                }
            }
        }
    }
}
