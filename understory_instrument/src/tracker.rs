// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instrumentation facade: one configured tracker with an `init`/`destroy` lifecycle.
//!
//! ## Driving
//!
//! A [`Tracker`] never reads a clock. The host forwards what happens and when:
//!
//! - [`Tracker::handle_event`] for every native event reaching the delegation root,
//! - [`Tracker::tick`] whenever it runs its loop (at the latest by
//!   [`Tracker::next_deadline`]),
//! - [`Tracker::on_visibility`] if its visibility provider pushes records instead of
//!   queuing them for [`take_records`](crate::VisibilityObserver::take_records).
//!
//! Every entry point first runs the timers due at or before `now`, in deadline order,
//! so the sink sees the same sequence it would under a real event loop.
//!
//! ## Reporting
//!
//! Interaction and exposure events share one [`Debouncer`]: within one quiet window
//! only the latest event of any kind reaches the sink. Sink errors are logged and the
//! event is dropped; listeners stay attached.

use alloc::vec::Vec;
use core::fmt;

use tracing::{debug, trace, warn};
use understory_timing::{Debouncer, TimerKey, TimerQueue};

use crate::attrs;
use crate::config::TrackerConfig;
use crate::document::{Document, query_selector};
use crate::error::{ConfigError, SinkError};
use crate::event::{EventKind, NativeEvent, TrackedEvent};
use crate::exposure::{Confirm, ExposureState, ExposureTracker};
use crate::router::{ListenerHandle, Router};
use crate::selector::Selector;
use crate::sink::EventSink;
use crate::visibility::{Containment, VisibilityEntry, VisibilityObserver};

/// Work scheduled on a tracker's timer queue.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Task<K> {
    /// Debounced delivery to the sink.
    Flush,
    /// Exposure confirmation for one element.
    Confirm(K),
    /// Periodic watch-set refresh.
    Refresh,
}

impl<K> From<Confirm<K>> for Task<K> {
    fn from(Confirm(node): Confirm<K>) -> Self {
        Self::Confirm(node)
    }
}

/// Placeholder sink type of a builder that has none yet. Cannot be constructed.
#[derive(Copy, Clone, Debug)]
pub enum NoSink {}

impl EventSink for NoSink {
    fn report(&mut self, _: &TrackedEvent) -> Result<(), SinkError> {
        match *self {}
    }
}

/// Placeholder observer type of a builder that has none. Cannot be constructed.
///
/// A tracker built without an observer runs interaction tracking only.
#[derive(Copy, Clone, Debug)]
pub enum NoObserver {}

impl<D: Document> VisibilityObserver<D> for NoObserver {
    fn observe(&mut self, _: &D, _: D::Node) {
        match *self {}
    }

    fn unobserve(&mut self, _: D::Node) {
        match *self {}
    }

    fn thresholds(&self) -> &[f64] {
        match *self {}
    }

    fn take_records(&mut self, _: &D) -> Vec<VisibilityEntry<D::Node>> {
        match *self {}
    }

    fn is_in_viewport(&self, _: &D, _: D::Node, _: Containment) -> bool {
        match *self {}
    }

    fn disconnect(&mut self) {
        match *self {}
    }
}

/// Assembles a [`Tracker`] from a configuration, a sink, and an optional observer.
///
/// ```
/// use understory_instrument::memory::MemoryDocument;
/// use understory_instrument::{ConfigError, EventLog, TrackerBuilder, TrackerConfig};
///
/// let doc = MemoryDocument::new();
///
/// // A sink is required.
/// let err = TrackerBuilder::new(TrackerConfig::default()).init(&doc, 0);
/// assert_eq!(err.err(), Some(ConfigError::MissingSink));
///
/// let tracker = TrackerBuilder::new(TrackerConfig::default())
///     .sink(EventLog::new())
///     .init(&doc, 0)
///     .unwrap();
/// assert!(tracker.is_active());
/// ```
#[derive(Clone, Debug)]
pub struct TrackerBuilder<S = NoSink, V = NoObserver> {
    config: TrackerConfig,
    sink: Option<S>,
    observer: Option<V>,
}

impl TrackerBuilder {
    /// Starts a builder for `config`.
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            sink: None,
            observer: None,
        }
    }
}

impl<S, V> TrackerBuilder<S, V> {
    /// Sets the reporting sink.
    #[must_use]
    pub fn sink<S2: EventSink>(self, sink: S2) -> TrackerBuilder<S2, V> {
        TrackerBuilder {
            config: self.config,
            sink: Some(sink),
            observer: self.observer,
        }
    }

    /// Sets the visibility observer used for exposure tracking.
    #[must_use]
    pub fn observer<V2>(self, observer: V2) -> TrackerBuilder<S, V2> {
        TrackerBuilder {
            config: self.config,
            sink: self.sink,
            observer: Some(observer),
        }
    }

    /// Validates the configuration and starts tracking on `doc` at time `now`.
    ///
    /// Resolves the delegation root, attaches the delegated listeners, and, when
    /// exposure is enabled and an observer is present, observes the initial watch
    /// set and schedules periodic refreshes. On error nothing is started.
    ///
    /// With exposure enabled, the observer's [`thresholds`](VisibilityObserver::thresholds)
    /// must include the configured exposure threshold.
    pub fn init<D>(self, doc: &D, now: u64) -> Result<Tracker<D, S, V>, ConfigError>
    where
        D: Document,
        S: EventSink,
        V: VisibilityObserver<D>,
    {
        let Self {
            config,
            sink,
            mut observer,
        } = self;
        config.validate()?;
        let sink = sink.ok_or(ConfigError::MissingSink)?;
        if let Some(observer) = observer.as_ref()
            && config.exposure_enabled()
            && !observer.thresholds().contains(&config.expose_threshold)
        {
            return Err(ConfigError::ObserverThreshold(config.expose_threshold));
        }

        let root = resolve_root(doc, config.root_selector.as_deref());
        let mut router = Router::new();
        let handles: Vec<ListenerHandle> = config
            .bindings()
            .into_iter()
            .map(|binding| router.attach(root, binding))
            .collect();

        let mut timers = TimerQueue::new();
        let exposure = match observer.as_mut() {
            Some(observer) if config.exposure_enabled() => {
                let mut exposure = ExposureTracker::new(
                    config.expose_selector(),
                    config.expose_threshold,
                    config.expose_confirm_ms,
                );
                let diff = exposure.refresh(doc, observer, &mut timers);
                timers.schedule_after(now, config.watch_refresh_ms, Task::Refresh);
                trace!(watched = diff.added.len(), "initial watch set");
                Some(exposure)
            }
            None if config.exposure_enabled() => {
                warn!("no visibility observer; exposure tracking disabled");
                None
            }
            _ => None,
        };

        debug!(
            prefix = %config.attribute_prefix,
            listeners = handles.len(),
            exposure = exposure.is_some(),
            ?root,
            "tracker initialized"
        );

        Ok(Tracker {
            debounce: Debouncer::new(config.debounce_wait_ms),
            config,
            root,
            router,
            handles,
            exposure,
            observer,
            timers,
            sink,
            active: true,
        })
    }
}

fn resolve_root<D: Document>(doc: &D, selector: Option<&str>) -> D::Node {
    let Some(text) = selector else {
        return doc.root();
    };
    match Selector::parse(text) {
        Ok(selector) => query_selector(doc, &selector).unwrap_or_else(|| {
            warn!(selector = text, "root selector matched nothing; using the document root");
            doc.root()
        }),
        Err(err) => {
            warn!(selector = text, %err, "invalid root selector; using the document root");
            doc.root()
        }
    }
}

/// A running instrumentation instance.
pub struct Tracker<D: Document, S, V> {
    config: TrackerConfig,
    root: D::Node,
    router: Router<D::Node>,
    handles: Vec<ListenerHandle>,
    exposure: Option<ExposureTracker<D::Node>>,
    observer: Option<V>,
    timers: TimerQueue<Task<D::Node>>,
    debounce: Debouncer<TrackedEvent>,
    sink: S,
    active: bool,
}

impl<D: Document, S, V> fmt::Debug for Tracker<D, S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("config", &self.config)
            .field("root", &self.root)
            .field("listeners", &self.router.len())
            .field("watched", &self.exposure.as_ref().map_or(0, |e| e.len()))
            .field("timers", &self.timers.len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl<D, S, V> Tracker<D, S, V>
where
    D: Document,
    S: EventSink,
    V: VisibilityObserver<D>,
{
    /// Delivers one native event that reached the delegation root at `now`.
    ///
    /// Returns the number of listeners that matched. Each match is parsed and passed
    /// through the shared debouncer; events whose target is outside the root match
    /// nothing.
    pub fn handle_event(&mut self, doc: &D, event: &NativeEvent<D::Node>, now: u64) -> usize {
        if !self.active {
            return 0;
        }
        self.advance(doc, now);
        let hits = self.router.route(doc, event);
        for hit in &hits {
            let extracted = attrs::extract(
                doc.attributes(hit.node),
                &self.config.attribute_prefix,
                hit.kind,
            );
            trace!(
                event = event.ty.as_str(),
                node = ?hit.node,
                phase = ?hit.phase,
                name = %extracted.name,
                "delegated event matched"
            );
            let tracked = TrackedEvent {
                name: extracted.name,
                params: extracted.params,
                kind: hit.kind,
            };
            self.debounce.call(&mut self.timers, now, tracked, Task::Flush);
        }
        hits.len()
    }

    /// Runs every timer due at or before `now` and applies pending visibility records.
    pub fn tick(&mut self, doc: &D, now: u64) {
        if self.active {
            self.advance(doc, now);
        }
    }

    /// Applies visibility records pushed by the host at `now`.
    pub fn on_visibility(&mut self, doc: &D, entries: &[VisibilityEntry<D::Node>], now: u64) {
        if !self.active {
            return;
        }
        self.advance(doc, now);
        if let Some(exposure) = self.exposure.as_mut() {
            for entry in entries {
                exposure.on_entry(entry, now, &mut self.timers);
            }
        }
    }

    /// Stops tracking: detaches every listener, cancels every pending timer including
    /// an undelivered debounced event, unobserves the watch set, and disconnects the
    /// observer.
    ///
    /// Calling it again does nothing. Afterwards no entry point reports anything.
    pub fn destroy(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        for handle in self.handles.drain(..) {
            self.router.detach(handle);
        }
        self.debounce.cancel(&mut self.timers);
        if let Some(observer) = self.observer.as_mut() {
            if let Some(mut exposure) = self.exposure.take() {
                exposure.teardown::<D, _, _>(observer, &mut self.timers);
            }
            observer.disconnect();
        }
        self.timers.clear();
        debug!("tracker destroyed");
    }

    fn advance(&mut self, doc: &D, now: u64) {
        loop {
            while let Some((key, task)) = self.timers.pop_due(now) {
                let at = key.deadline();
                match task {
                    Task::Flush => {
                        if let Some(event) = self.debounce.fire(key) {
                            self.deliver(&event);
                        }
                    }
                    Task::Confirm(node) => self.confirm(doc, node, key, at),
                    Task::Refresh => {
                        self.refresh(doc);
                        self.pull_records(doc, at);
                        let period = self.config.watch_refresh_ms;
                        // Late hosts skip missed refreshes instead of replaying them.
                        let next = if at.saturating_add(period) >= now { at } else { now };
                        self.timers.schedule_after(next, period, Task::Refresh);
                    }
                }
            }
            self.pull_records(doc, now);
            if self.timers.next_deadline().is_none_or(|deadline| deadline > now) {
                return;
            }
        }
    }

    fn refresh(&mut self, doc: &D) {
        let (Some(exposure), Some(observer)) = (self.exposure.as_mut(), self.observer.as_mut())
        else {
            return;
        };
        let diff = exposure.refresh(doc, observer, &mut self.timers);
        if !diff.added.is_empty() || !diff.removed.is_empty() {
            trace!(
                added = diff.added.len(),
                removed = diff.removed.len(),
                watched = exposure.len(),
                "watch set refreshed"
            );
        }
    }

    fn pull_records(&mut self, doc: &D, now: u64) {
        let (Some(exposure), Some(observer)) = (self.exposure.as_mut(), self.observer.as_mut())
        else {
            return;
        };
        for entry in observer.take_records(doc) {
            exposure.on_entry(&entry, now, &mut self.timers);
        }
    }

    fn confirm(&mut self, doc: &D, node: D::Node, key: TimerKey, at: u64) {
        let (Some(exposure), Some(observer)) = (self.exposure.as_mut(), self.observer.as_ref())
        else {
            return;
        };
        if !exposure.confirm(doc, observer, node, key) {
            trace!(?node, "exposure not confirmed");
            return;
        }
        let extracted = attrs::extract(
            doc.attributes(node),
            &self.config.attribute_prefix,
            EventKind::Expose,
        );
        debug!(?node, name = %extracted.name, "exposure confirmed");
        let tracked = TrackedEvent {
            name: extracted.name,
            params: extracted.params,
            kind: EventKind::Expose,
        };
        self.debounce.call(&mut self.timers, at, tracked, Task::Flush);
    }

    fn deliver(&mut self, event: &TrackedEvent) {
        if let Err(err) = self.sink.report(event) {
            warn!(%err, name = %event.name, kind = %event.kind, "event dropped");
        }
    }
}

impl<D: Document, S, V> Tracker<D, S, V> {
    /// Returns `true` until [`destroy`](Self::destroy) is called.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The configuration this tracker was built with.
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The resolved delegation root.
    #[must_use]
    pub fn root(&self) -> D::Node {
        self.root
    }

    /// Number of attached delegated listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.router.len()
    }

    /// Earliest pending timer deadline; the host should tick by then.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// The event waiting for the debounce window to close, if any.
    #[must_use]
    pub fn pending_event(&self) -> Option<&TrackedEvent> {
        self.debounce.peek()
    }

    /// Whether exposure tracking is running.
    #[must_use]
    pub fn exposure_enabled(&self) -> bool {
        self.exposure.is_some()
    }

    /// Size of the exposure watch set.
    #[must_use]
    pub fn watched_len(&self) -> usize {
        self.exposure.as_ref().map_or(0, ExposureTracker::len)
    }

    /// Exposure state of `node`.
    #[must_use]
    pub fn exposure_state(&self, node: D::Node) -> ExposureState {
        self.exposure
            .as_ref()
            .map_or(ExposureState::Unobserved, |e| e.state(node))
    }

    /// The reporting sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The reporting sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The visibility observer, if one was supplied.
    pub fn observer_mut(&mut self) -> Option<&mut V> {
        self.observer.as_mut()
    }

    /// Consumes the tracker and returns its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
