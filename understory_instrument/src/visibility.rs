// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility observation capability.
//!
//! The exposure tracker consumes visibility the way a page consumes an
//! intersection observer: it registers elements, then receives records carrying the
//! fraction of each element's area that is on screen. Records may be pulled with
//! [`VisibilityObserver::take_records`] on every tick, or pushed by the host through
//! [`Tracker::on_visibility`](crate::Tracker::on_visibility).

use alloc::vec::Vec;

use crate::document::Document;

/// One visibility report for an observed element.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VisibilityEntry<K> {
    /// Reported element.
    pub node: K,
    /// Visible fraction of the element's area, in `[0, 1]`.
    pub ratio: f64,
}

/// How much of an element must lie inside the viewport for a containment check.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Containment {
    /// Any overlap with the viewport counts.
    #[default]
    Partial,
    /// The element must lie entirely within the viewport.
    Full,
}

/// A source of visibility records for a set of observed elements.
pub trait VisibilityObserver<D: Document> {
    /// Starts observing `node`. Observing an element twice is a no-op.
    fn observe(&mut self, doc: &D, node: D::Node);

    /// Stops observing `node` and discards its pending records.
    fn unobserve(&mut self, node: D::Node);

    /// Ratios at which records are produced.
    fn thresholds(&self) -> &[f64];

    /// Drains pending records.
    fn take_records(&mut self, doc: &D) -> Vec<VisibilityEntry<D::Node>>;

    /// Synchronous viewport check, used to re-validate before confirming exposure.
    fn is_in_viewport(&self, doc: &D, node: D::Node, containment: Containment) -> bool;

    /// Stops observing everything.
    fn disconnect(&mut self);
}
