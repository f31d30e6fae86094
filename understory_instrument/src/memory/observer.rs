// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use kurbo::Rect;

use super::document::{ElementId, MemoryDocument};
use crate::document::Document;
use crate::visibility::{Containment, VisibilityEntry, VisibilityObserver};

#[derive(Copy, Clone, Debug)]
struct Observed {
    node: ElementId,
    /// Number of thresholds crossed at the last record; `None` before the first.
    crossed: Option<usize>,
}

/// Kurbo-backed visibility observer for a [`MemoryDocument`].
///
/// The viewport is a world-space rectangle; scroll by moving it with
/// [`set_viewport`](Self::set_viewport).
///
/// ```
/// use kurbo::Rect;
/// use understory_instrument::memory::{MemoryDocument, ViewportObserver};
/// use understory_instrument::{Document, VisibilityObserver};
///
/// let mut doc = MemoryDocument::new();
/// let el = doc.append_new(doc.root(), "div", &[]);
/// doc.set_bounds(el, Rect::new(0.0, 80.0, 100.0, 120.0));
///
/// let mut vp = ViewportObserver::new(Rect::new(0.0, 0.0, 100.0, 100.0), [0.5]);
/// vp.observe(&doc, el);
/// let records = vp.take_records(&doc);
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].ratio, 0.5);
///
/// // Unchanged geometry produces no further records.
/// assert!(vp.take_records(&doc).is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct ViewportObserver {
    viewport: Rect,
    thresholds: Vec<f64>,
    observed: Vec<Observed>,
}

impl ViewportObserver {
    /// Creates an observer over `viewport` reporting at `thresholds`.
    ///
    /// Thresholds are clamped to `[0, 1]`, sorted and deduplicated; non-finite values
    /// are dropped. An empty list means `[0.0]` (any intersection).
    pub fn new(viewport: Rect, thresholds: impl IntoIterator<Item = f64>) -> Self {
        let mut thresholds: Vec<f64> = thresholds
            .into_iter()
            .filter(|t| t.is_finite())
            .map(|t| t.clamp(0.0, 1.0))
            .collect();
        thresholds.sort_by(f64::total_cmp);
        thresholds.dedup();
        if thresholds.is_empty() {
            thresholds.push(0.0);
        }
        Self {
            viewport,
            thresholds,
            observed: Vec::new(),
        }
    }

    /// The current viewport.
    #[must_use]
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Moves or resizes the viewport. Records reflect it on the next
    /// [`take_records`](VisibilityObserver::take_records).
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// Number of observed elements.
    #[must_use]
    pub fn observed_len(&self) -> usize {
        self.observed.len()
    }

    /// Returns `true` if `node` is observed.
    #[must_use]
    pub fn is_observing(&self, node: ElementId) -> bool {
        self.observed.iter().any(|o| o.node == node)
    }

    /// Visible fraction of `node`'s box inside the viewport.
    ///
    /// Detached elements report `0.0`. A zero-area box reports `1.0` when it lies
    /// within the viewport edges.
    #[must_use]
    pub fn ratio(&self, doc: &MemoryDocument, node: ElementId) -> f64 {
        if !doc.is_connected(node) {
            return 0.0;
        }
        let Some(bounds) = doc.bounds(node) else {
            return 0.0;
        };
        let area = bounds.area();
        if area <= 0.0 {
            return if contains(self.viewport, bounds) { 1.0 } else { 0.0 };
        }
        (bounds.intersect(self.viewport).area() / area).clamp(0.0, 1.0)
    }

    fn crossed(&self, ratio: f64) -> usize {
        self.thresholds
            .iter()
            .filter(|&&t| if t == 0.0 { ratio > 0.0 } else { ratio >= t })
            .count()
    }
}

fn contains(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

impl VisibilityObserver<MemoryDocument> for ViewportObserver {
    fn observe(&mut self, _doc: &MemoryDocument, node: ElementId) {
        if !self.is_observing(node) {
            self.observed.push(Observed {
                node,
                crossed: None,
            });
        }
    }

    fn unobserve(&mut self, node: ElementId) {
        self.observed.retain(|o| o.node != node);
    }

    fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    fn take_records(&mut self, doc: &MemoryDocument) -> Vec<VisibilityEntry<ElementId>> {
        let mut records = Vec::new();
        for i in 0..self.observed.len() {
            let node = self.observed[i].node;
            let ratio = self.ratio(doc, node);
            let crossed = self.crossed(ratio);
            if self.observed[i].crossed != Some(crossed) {
                self.observed[i].crossed = Some(crossed);
                records.push(VisibilityEntry { node, ratio });
            }
        }
        records
    }

    fn is_in_viewport(&self, doc: &MemoryDocument, node: ElementId, containment: Containment) -> bool {
        if !doc.is_connected(node) {
            return false;
        }
        let Some(bounds) = doc.bounds(node) else {
            return false;
        };
        match containment {
            Containment::Full => contains(self.viewport, bounds),
            Containment::Partial if bounds.area() <= 0.0 => contains(self.viewport, bounds),
            Containment::Partial => overlaps(self.viewport, bounds),
        }
    }

    fn disconnect(&mut self) {
        self.observed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(bounds: Rect) -> (MemoryDocument, ElementId) {
        let mut doc = MemoryDocument::new();
        let el = doc.append_new(doc.root(), "div", &[]);
        doc.set_bounds(el, bounds);
        (doc, el)
    }

    const VIEW: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);

    #[test]
    fn thresholds_are_normalized() {
        let vp = ViewportObserver::new(VIEW, [0.5, f64::NAN, 2.0, 0.5, -1.0]);
        assert_eq!(vp.thresholds(), [0.0, 0.5, 1.0]);
        let vp = ViewportObserver::new(VIEW, []);
        assert_eq!(vp.thresholds(), [0.0]);
    }

    #[test]
    fn ratio_tracks_scrolling() {
        let (doc, el) = doc_with(Rect::new(0.0, 150.0, 100.0, 250.0));
        let mut vp = ViewportObserver::new(VIEW, [0.5]);
        assert_eq!(vp.ratio(&doc, el), 0.0);
        vp.set_viewport(Rect::new(0.0, 100.0, 100.0, 200.0));
        assert_eq!(vp.ratio(&doc, el), 0.5);
        vp.set_viewport(Rect::new(0.0, 150.0, 100.0, 250.0));
        assert_eq!(vp.ratio(&doc, el), 1.0);
    }

    #[test]
    fn records_on_first_observation_and_bucket_changes() {
        let (doc, el) = doc_with(Rect::new(0.0, 150.0, 100.0, 250.0));
        let mut vp = ViewportObserver::new(VIEW, [0.5]);
        vp.observe(&doc, el);
        vp.observe(&doc, el);
        assert_eq!(vp.observed_len(), 1);

        let first = vp.take_records(&doc);
        assert_eq!(first, [VisibilityEntry { node: el, ratio: 0.0 }]);

        // Partially visible but below 0.5: same bucket, no record.
        vp.set_viewport(Rect::new(0.0, 60.0, 100.0, 160.0));
        assert!(vp.take_records(&doc).is_empty());

        vp.set_viewport(Rect::new(0.0, 100.0, 100.0, 200.0));
        let crossed = vp.take_records(&doc);
        assert_eq!(crossed.len(), 1);
        assert_eq!(crossed[0].ratio, 0.5);

        vp.unobserve(el);
        vp.set_viewport(VIEW);
        assert!(vp.take_records(&doc).is_empty());
    }

    #[test]
    fn containment_checks() {
        let (mut doc, el) = doc_with(Rect::new(50.0, 50.0, 150.0, 150.0));
        let vp = ViewportObserver::new(VIEW, [0.5]);
        assert!(vp.is_in_viewport(&doc, el, Containment::Partial));
        assert!(!vp.is_in_viewport(&doc, el, Containment::Full));

        doc.set_bounds(el, Rect::new(100.0, 0.0, 200.0, 100.0));
        assert!(!vp.is_in_viewport(&doc, el, Containment::Partial));

        doc.set_bounds(el, Rect::new(10.0, 10.0, 10.0, 10.0));
        assert!(vp.is_in_viewport(&doc, el, Containment::Partial));
        assert_eq!(vp.ratio(&doc, el), 1.0);

        doc.remove(el);
        assert!(!vp.is_in_viewport(&doc, el, Containment::Partial));
        assert_eq!(vp.ratio(&doc, el), 0.0);
    }

    #[test]
    fn disconnect_forgets_everything() {
        let (doc, el) = doc_with(VIEW);
        let mut vp = ViewportObserver::new(VIEW, [0.5]);
        vp.observe(&doc, el);
        vp.disconnect();
        assert!(!vp.is_observing(el));
        assert!(vp.take_records(&doc).is_empty());
    }
}
