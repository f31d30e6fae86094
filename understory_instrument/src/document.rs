// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document capability: the element tree the instrumentation reads.
//!
//! The instrumentation never reaches for a global document. Hosts pass a value
//! implementing [`Document`] into every call, so the same code runs against a live
//! browser binding, a server-side tree, or the in-memory tree from the `memory`
//! feature.
//!
//! Selector queries are provided on top of the trait and run in document order
//! (pre-order, depth first).

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use crate::selector::Selector;

/// Read access to an element tree.
///
/// Node handles may outlive the elements they name. Implementations must treat a
/// stale handle as a detached element with no attributes: `parent` is `None`,
/// `is_connected` is `false`, `attribute` is `None`.
pub trait Document {
    /// Element identity. Two distinct elements never compare equal, whatever their
    /// attributes.
    type Node: Copy + Eq + Hash + Debug;

    /// Iterator over an element's children in document order.
    type Children<'a>: Iterator<Item = Self::Node>
    where
        Self: 'a;

    /// Iterator over an element's attributes as `(name, value)` pairs.
    type Attributes<'a>: Iterator<Item = (&'a str, &'a str)>
    where
        Self: 'a;

    /// The document element; the fallback delegation root.
    fn root(&self) -> Self::Node;

    /// Parent element, if any.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Children of `node`.
    fn children(&self, node: Self::Node) -> Self::Children<'_>;

    /// Whether `node` is live and attached under [`root`](Self::root).
    fn is_connected(&self, node: Self::Node) -> bool;

    /// Lowercase tag name, or `""` for a stale node.
    fn tag_name(&self, node: Self::Node) -> &str;

    /// Value of the named attribute.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// All attributes of `node`.
    fn attributes(&self, node: Self::Node) -> Self::Attributes<'_>;
}

/// First element under the root, in document order, matching `selector`.
pub fn query_selector<D: Document>(doc: &D, selector: &Selector) -> Option<D::Node> {
    let mut found = None;
    walk(doc, |node| {
        if selector.matches(doc, node) {
            found = Some(node);
            false
        } else {
            true
        }
    });
    found
}

/// All elements under the root, in document order, matching `selector`.
pub fn query_selector_all<D: Document>(doc: &D, selector: &Selector) -> Vec<D::Node> {
    let mut out = Vec::new();
    walk(doc, |node| {
        if selector.matches(doc, node) {
            out.push(node);
        }
        true
    });
    out
}

/// Nearest inclusive ancestor of `start` matching `selector`, searching no higher
/// than `boundary`.
///
/// Returns `None` when nothing matches or when `start` is not `boundary` or one of
/// its descendants.
pub fn closest_within<D: Document>(
    doc: &D,
    start: D::Node,
    selector: &Selector,
    boundary: D::Node,
) -> Option<D::Node> {
    let mut found = None;
    let mut node = start;
    loop {
        if found.is_none() && selector.matches(doc, node) {
            found = Some(node);
        }
        if node == boundary {
            return found;
        }
        node = doc.parent(node)?;
    }
}

/// Pre-order walk from the root; `visit` returns `false` to stop.
fn walk<D: Document>(doc: &D, mut visit: impl FnMut(D::Node) -> bool) {
    let mut stack = alloc::vec![doc.root()];
    while let Some(node) = stack.pop() {
        if !visit(node) {
            return;
        }
        let start = stack.len();
        stack.extend(doc.children(node));
        stack[start..].reverse();
    }
}
