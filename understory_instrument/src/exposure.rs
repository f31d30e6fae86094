// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exposure tracker: turns visibility records into confirmed exposures.
//!
//! ## States
//!
//! Every element in the watch set is in one [`ExposureState`]:
//!
//! - `Unobserved`: watched, but no qualifying record yet (or the last one fell
//!   below the threshold after a confirmation).
//! - `Armed`: a record at or above the threshold started a confirmation timer.
//! - `Confirmed`: the timer fired and the element was still on screen.
//!
//! A record at or above the threshold always (re)arms, cancelling any earlier
//! confirmation timer for that element, including from `Confirmed`. A record below
//! the threshold moves `Confirmed` back to `Unobserved` but does **not** cancel a
//! pending timer while `Armed`; the timer's own viewport re-check decides. This
//! means an element that dips below the threshold but stays partly on screen can
//! still be confirmed.
//!
//! ## Watch set
//!
//! [`ExposureTracker::refresh`] re-queries the document and reconciles: elements
//! that no longer match (or left the document) are unobserved and their timers
//! cancelled; new matches are observed. Identity is the node handle, never the
//! attribute value, and no element is observed twice.
//!
//! Timer state lives in a side table keyed by node, never on the element.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::{HashMap, HashSet};
use understory_timing::{TimerKey, TimerQueue};

use crate::document::{Document, query_selector_all};
use crate::selector::Selector;
use crate::visibility::{Containment, VisibilityEntry, VisibilityObserver};

/// Exposure state of a watched element.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExposureState {
    /// Watched (or not watched at all) without a pending or completed confirmation.
    #[default]
    Unobserved,
    /// Waiting for the confirmation timer.
    Armed,
    /// Exposure reported.
    Confirmed,
}

/// Timer task asking the tracker to confirm an element's exposure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Confirm<K>(pub K);

#[derive(Copy, Clone, Debug, Default)]
struct Watch {
    state: ExposureState,
    timer: Option<TimerKey>,
}

/// Outcome of one watch-set refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshDiff<K> {
    /// Newly observed elements, in document order.
    pub added: Vec<K>,
    /// Elements no longer observed.
    pub removed: Vec<K>,
}

/// Per-element exposure state machine over a dynamic watch set.
#[derive(Clone, Debug)]
pub struct ExposureTracker<K> {
    selector: Selector,
    threshold: f64,
    confirm_ms: u64,
    watch: HashMap<K, Watch>,
}

impl<K: Copy + Eq + Hash> ExposureTracker<K> {
    /// Creates a tracker for elements matching `selector`.
    #[must_use]
    pub fn new(selector: Selector, threshold: f64, confirm_ms: u64) -> Self {
        Self {
            selector,
            threshold,
            confirm_ms,
            watch: HashMap::new(),
        }
    }

    /// Selector defining the exposable elements.
    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Number of watched elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.watch.len()
    }

    /// Returns `true` when nothing is watched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watch.is_empty()
    }

    /// Returns `true` if `node` is in the watch set.
    #[must_use]
    pub fn is_watched(&self, node: K) -> bool {
        self.watch.contains_key(&node)
    }

    /// Current state of `node`; unwatched elements are `Unobserved`.
    #[must_use]
    pub fn state(&self, node: K) -> ExposureState {
        self.watch.get(&node).map(|w| w.state).unwrap_or_default()
    }

    /// Number of pending confirmation timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.watch.values().filter(|w| w.timer.is_some()).count()
    }

    /// Reconciles the watch set with the elements currently matching the selector.
    pub fn refresh<D, V, T>(
        &mut self,
        doc: &D,
        observer: &mut V,
        timers: &mut TimerQueue<T>,
    ) -> RefreshDiff<K>
    where
        D: Document<Node = K>,
        V: VisibilityObserver<D>,
    {
        let live = query_selector_all(doc, &self.selector);
        let live_set: HashSet<K> = live.iter().copied().collect();

        let mut diff = RefreshDiff {
            added: Vec::new(),
            removed: Vec::new(),
        };
        self.watch.retain(|&node, watch| {
            if live_set.contains(&node) {
                return true;
            }
            if let Some(key) = watch.timer.take() {
                timers.cancel(key);
            }
            observer.unobserve(node);
            diff.removed.push(node);
            false
        });
        for node in live {
            if self.watch.contains_key(&node) {
                continue;
            }
            observer.observe(doc, node);
            self.watch.insert(node, Watch::default());
            diff.added.push(node);
        }
        diff
    }

    /// Applies one visibility record observed at `now`.
    ///
    /// Records for elements outside the watch set are ignored.
    pub fn on_entry<T>(&mut self, entry: &VisibilityEntry<K>, now: u64, timers: &mut TimerQueue<T>)
    where
        T: From<Confirm<K>>,
    {
        let Some(watch) = self.watch.get_mut(&entry.node) else {
            return;
        };
        if entry.ratio >= self.threshold {
            if let Some(key) = watch.timer.take() {
                timers.cancel(key);
            }
            let key = timers.schedule_after(now, self.confirm_ms, T::from(Confirm(entry.node)));
            watch.timer = Some(key);
            watch.state = ExposureState::Armed;
        } else if watch.state == ExposureState::Confirmed {
            watch.state = ExposureState::Unobserved;
        }
    }

    /// Handles a fired confirmation timer. Returns `true` if the exposure is confirmed.
    ///
    /// Stale keys (superseded by re-arming or cancelled by a refresh) are ignored.
    /// The element must still be watched, connected, and at least partly within the
    /// viewport.
    pub fn confirm<D, V>(&mut self, doc: &D, observer: &V, node: K, key: TimerKey) -> bool
    where
        D: Document<Node = K>,
        V: VisibilityObserver<D>,
    {
        let Some(watch) = self.watch.get_mut(&node) else {
            return false;
        };
        if watch.timer != Some(key) {
            return false;
        }
        watch.timer = None;
        if doc.is_connected(node) && observer.is_in_viewport(doc, node, Containment::Partial) {
            watch.state = ExposureState::Confirmed;
            true
        } else {
            watch.state = ExposureState::Unobserved;
            false
        }
    }

    /// Cancels every pending timer, unobserves every element, and empties the watch set.
    pub fn teardown<D, V, T>(&mut self, observer: &mut V, timers: &mut TimerQueue<T>)
    where
        D: Document<Node = K>,
        V: VisibilityObserver<D>,
    {
        for (node, watch) in self.watch.drain() {
            if let Some(key) = watch.timer {
                timers.cancel(key);
            }
            observer.unobserve(node);
        }
    }
}
