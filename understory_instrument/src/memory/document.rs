// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Rect;
use smallvec::SmallVec;

use crate::document::Document;

/// Identifier for an element in a [`MemoryDocument`].
///
/// A slot index plus a generation counter. Deleting an element frees its slot;
/// reusing the slot bumps the generation, so stale ids never alias a new element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(u32, u32);

impl ElementId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Element {
    generation: u32,
    live: bool,
    tag: String,
    attributes: SmallVec<[(String, String); 4]>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    bounds: Rect,
}

/// A mutable element tree held in memory.
///
/// ```
/// use kurbo::Rect;
/// use understory_instrument::memory::MemoryDocument;
/// use understory_instrument::Document;
///
/// let mut doc = MemoryDocument::new();
/// let card = doc.append_new(doc.root(), "div", &[("data-t-expose", "card")]);
/// doc.set_bounds(card, Rect::new(0.0, 0.0, 100.0, 50.0));
///
/// assert!(doc.is_connected(card));
/// assert_eq!(doc.attribute(card, "data-t-expose"), Some("card"));
///
/// doc.remove(card);
/// assert!(!doc.is_connected(card));
/// ```
#[derive(Clone, Debug)]
pub struct MemoryDocument {
    elements: Vec<Element>,
    free: Vec<u32>,
    root: ElementId,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Creates a document holding only an `html` root element.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            elements: Vec::new(),
            free: Vec::new(),
            root: ElementId(0, 1),
        };
        doc.root = doc.create_element("html");
        doc
    }

    fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements
            .get(id.idx())
            .filter(|e| e.live && e.generation == id.1)
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements
            .get_mut(id.idx())
            .filter(|e| e.live && e.generation == id.1)
    }

    /// Returns `true` if `id` names a live (not deleted) element, attached or not.
    #[must_use]
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        let element = |generation| Element {
            generation,
            live: true,
            tag: tag.to_ascii_lowercase(),
            attributes: SmallVec::new(),
            parent: None,
            children: Vec::new(),
            bounds: Rect::ZERO,
        };
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.elements[idx as usize];
            let generation = slot.generation.wrapping_add(1);
            *slot = element(generation);
            return ElementId(idx, generation);
        }
        let idx = u32::try_from(self.elements.len()).unwrap_or(u32::MAX);
        self.elements.push(element(1));
        ElementId(idx, 1)
    }

    /// Creates an element with `attributes`, appends it to `parent`, and returns it.
    pub fn append_new(
        &mut self,
        parent: ElementId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> ElementId {
        let id = self.create_element(tag);
        for &(name, value) in attributes {
            self.set_attribute(id, name, value);
        }
        self.append_child(parent, id);
        id
    }

    /// Moves `child` to the end of `parent`'s children.
    ///
    /// Returns `false` if either id is stale, or if `parent` is `child` or one of
    /// its descendants.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        if !self.is_alive(parent) || !self.is_alive(child) {
            return false;
        }
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return false;
            }
            cursor = self.get(node).and_then(|e| e.parent);
        }
        self.remove(child);
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
        true
    }

    /// Detaches `node` (and its subtree) from its parent. The element stays alive
    /// and can be appended again. Returns `false` if it was not attached.
    pub fn remove(&mut self, node: ElementId) -> bool {
        let Some(parent) = self.get(node).and_then(|e| e.parent) else {
            return false;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != node);
        }
        if let Some(e) = self.get_mut(node) {
            e.parent = None;
        }
        true
    }

    /// Detaches and frees `node` and its whole subtree. Their ids become stale.
    pub fn delete(&mut self, node: ElementId) {
        if node == self.root || !self.is_alive(node) {
            return;
        }
        self.remove(node);
        let mut stack = alloc::vec![node];
        while let Some(id) = stack.pop() {
            if let Some(e) = self.get_mut(id) {
                e.live = false;
                e.parent = None;
                e.attributes.clear();
                stack.append(&mut e.children);
                self.free.push(id.0);
            }
        }
    }

    /// Sets an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, node: ElementId, name: &str, value: &str) {
        let Some(e) = self.get_mut(node) else {
            return;
        };
        if let Some(slot) = e.attributes.iter_mut().find(|(n, _)| n == name) {
            slot.1 = String::from(value);
        } else {
            e.attributes.push((String::from(name), String::from(value)));
        }
    }

    /// Removes an attribute, returning its value.
    pub fn remove_attribute(&mut self, node: ElementId, name: &str) -> Option<String> {
        let e = self.get_mut(node)?;
        let at = e.attributes.iter().position(|(n, _)| n == name)?;
        Some(e.attributes.remove(at).1)
    }

    /// Sets the element's world-space bounding box.
    pub fn set_bounds(&mut self, node: ElementId, bounds: Rect) {
        if let Some(e) = self.get_mut(node) {
            e.bounds = bounds;
        }
    }

    /// The element's world-space bounding box.
    #[must_use]
    pub fn bounds(&self, node: ElementId) -> Option<Rect> {
        self.get(node).map(|e| e.bounds)
    }
}

/// Iterator over an element's attributes.
#[derive(Clone, Debug)]
pub struct AttributeIter<'a> {
    inner: core::slice::Iter<'a, (String, String)>,
}

impl<'a> Iterator for AttributeIter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl Document for MemoryDocument {
    type Node = ElementId;
    type Children<'a> = core::iter::Copied<core::slice::Iter<'a, ElementId>>;
    type Attributes<'a> = AttributeIter<'a>;

    fn root(&self) -> ElementId {
        self.root
    }

    fn parent(&self, node: ElementId) -> Option<ElementId> {
        self.get(node)?.parent
    }

    fn children(&self, node: ElementId) -> Self::Children<'_> {
        self.get(node)
            .map_or(&[][..], |e| e.children.as_slice())
            .iter()
            .copied()
    }

    fn is_connected(&self, node: ElementId) -> bool {
        let mut cursor = node;
        loop {
            if cursor == self.root {
                return self.is_alive(cursor);
            }
            match self.parent(cursor) {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    fn tag_name(&self, node: ElementId) -> &str {
        self.get(node).map_or("", |e| e.tag.as_str())
    }

    fn attribute(&self, node: ElementId, name: &str) -> Option<&str> {
        self.get(node)?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn attributes(&self, node: ElementId) -> AttributeIter<'_> {
        AttributeIter {
            inner: self.get(node).map_or(&[][..], |e| &e.attributes[..]).iter(),
        }
    }
}
