// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reporting sink.

use alloc::vec::Vec;

use crate::error::SinkError;
use crate::event::{Params, TrackedEvent};

/// Receives every event that survives debouncing.
///
/// Any closure taking `(name, params, kind)` is a sink:
///
/// ```
/// use understory_instrument::{EventKind, EventSink, Params, TrackedEvent};
///
/// let mut seen = Vec::new();
/// let mut sink = |name: &str, _params: &Params, kind: &str| seen.push(format!("{kind}:{name}"));
/// sink.report(&TrackedEvent {
///     name: "buy".into(),
///     params: Params::new(),
///     kind: EventKind::Click,
/// })
/// .unwrap();
/// drop(sink);
/// assert_eq!(seen, ["click:buy"]);
/// ```
pub trait EventSink {
    /// Delivers one event. Errors are logged by the caller and the event is dropped.
    fn report(&mut self, event: &TrackedEvent) -> Result<(), SinkError>;
}

impl<F> EventSink for F
where
    F: FnMut(&str, &Params, &str),
{
    fn report(&mut self, event: &TrackedEvent) -> Result<(), SinkError> {
        self(&event.name, &event.params, event.kind.as_str());
        Ok(())
    }
}

/// A sink that records every delivered event in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<TrackedEvent>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events delivered so far.
    #[must_use]
    pub fn events(&self) -> &[TrackedEvent] {
        &self.events
    }

    /// Takes the delivered events, leaving the log empty.
    pub fn take(&mut self) -> Vec<TrackedEvent> {
        core::mem::take(&mut self.events)
    }
}

impl EventSink for EventLog {
    fn report(&mut self, event: &TrackedEvent) -> Result<(), SinkError> {
        self.events.push(event.clone());
        Ok(())
    }
}
