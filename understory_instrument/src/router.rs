// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegated event router: a bounded set of root listeners matched by selector.
//!
//! ## Overview
//!
//! Each listener sits on a delegation root and names a native event type, a phase
//! (capture or bubble), a selector, and the [`EventKind`] it reports as. For every
//! native event, [`Router::route`] walks from the event's original target up to the
//! root and, per listener, picks the nearest element that matches the selector.
//!
//! The router only computes who would be notified. Executing handlers (parsing
//! attributes, debouncing, reporting) is the caller's job.
//!
//! ## Phases
//!
//! - Capture listeners on the root run before any descendant handler, so they see
//!   every event whose target lies under the root, bubbling or not.
//! - Bubble listeners see an event only if it bubbles and no handler strictly below
//!   the root stopped its propagation.
//! - When the target is the root itself, both kinds run in the target phase.
//!
//! Within one event, capture-phase results come before bubble-phase results, each
//! group in attach order.
//!
//! ## Handles
//!
//! [`Router::attach`] returns a generational [`ListenerHandle`]. Detaching removes
//! exactly that listener; detaching twice, or detaching a handle whose slot was
//! reused, is a no-op.

use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::document::{Document, closest_within};
use crate::event::{EventKind, NativeEvent, NativeEventType};
use crate::selector::Selector;

/// Propagation phase in which a listener observed an event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Root-to-target pass.
    Capture,
    /// The root is the target.
    Target,
    /// Target-to-root pass.
    Bubble,
}

/// What a listener listens for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    /// Elements that trigger this listener.
    pub selector: Selector,
    /// Native event type.
    pub ty: NativeEventType,
    /// Kind reported for matches.
    pub kind: EventKind,
    /// Listen in the capture phase instead of the bubble phase.
    pub capture: bool,
}

/// Handle to an attached listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    idx: u32,
    generation: u32,
}

/// One listener notification produced by [`Router::route`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Delegated<K> {
    /// Listener that matched.
    pub handle: ListenerHandle,
    /// Nearest element at or above the target that matched the listener's selector.
    pub node: K,
    /// Kind the listener reports as.
    pub kind: EventKind,
    /// Phase in which the listener ran.
    pub phase: Phase,
}

#[derive(Clone, Debug)]
struct Slot<K> {
    generation: u32,
    listener: Option<(K, Binding)>,
}

/// Listener table for delegated events.
#[derive(Clone, Debug)]
pub struct Router<K> {
    slots: Vec<Slot<K>>,
    free: Vec<u32>,
    live: usize,
}

impl<K> Default for Router<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Router<K> {
    /// Creates an empty router.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Attaches a listener for `binding` on `root`.
    pub fn attach(&mut self, root: K, binding: Binding) -> ListenerHandle {
        self.live += 1;
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.listener = Some((root, binding));
            return ListenerHandle {
                idx,
                generation: slot.generation,
            };
        }
        let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 1,
            listener: Some((root, binding)),
        });
        ListenerHandle { idx, generation: 1 }
    }

    /// Detaches the listener behind `handle`. Returns `true` if it was attached.
    pub fn detach(&mut self, handle: ListenerHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.idx as usize) else {
            return false;
        };
        if slot.generation != handle.generation || slot.listener.is_none() {
            return false;
        }
        slot.listener = None;
        self.free.push(handle.idx);
        self.live -= 1;
        true
    }

    /// Returns `true` if `handle` names an attached listener.
    #[must_use]
    pub fn is_attached(&self, handle: ListenerHandle) -> bool {
        self.binding(handle).is_some()
    }

    /// The binding behind an attached `handle`.
    #[must_use]
    pub fn binding(&self, handle: ListenerHandle) -> Option<&Binding> {
        let slot = self.slots.get(handle.idx as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.listener.as_ref().map(|(_, b)| b)
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` when no listener is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Detaches every listener. Outstanding handles become stale.
    pub fn detach_all(&mut self) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.listener.take().is_some() {
                self.free.push(u32::try_from(idx).unwrap_or(u32::MAX));
            }
        }
        self.live = 0;
    }

    fn attached(&self) -> impl Iterator<Item = (ListenerHandle, &K, &Binding)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            let (root, binding) = slot.listener.as_ref()?;
            let handle = ListenerHandle {
                idx: u32::try_from(idx).ok()?,
                generation: slot.generation,
            };
            Some((handle, root, binding))
        })
    }
}

impl<K: Copy + Eq> Router<K> {
    /// Computes which listeners observe `event`, and on which element.
    pub fn route<D>(&self, doc: &D, event: &NativeEvent<K>) -> SmallVec<[Delegated<K>; 4]>
    where
        D: Document<Node = K>,
    {
        let mut capture: SmallVec<[Delegated<K>; 4]> = SmallVec::new();
        let mut bubble: SmallVec<[Delegated<K>; 4]> = SmallVec::new();

        for (handle, &root, binding) in self.attached() {
            if binding.ty != event.ty {
                continue;
            }
            let at_target = event.target == root;
            let phase = match (at_target, binding.capture) {
                (true, _) => Phase::Target,
                (false, true) => Phase::Capture,
                (false, false) => Phase::Bubble,
            };
            if phase == Phase::Bubble && !reaches_root_bubbling(doc, event, root) {
                continue;
            }
            let Some(node) = closest_within(doc, event.target, &binding.selector, root) else {
                continue;
            };
            let hit = Delegated {
                handle,
                node,
                kind: binding.kind,
                phase,
            };
            if binding.capture {
                capture.push(hit);
            } else {
                bubble.push(hit);
            }
        }

        capture.extend(bubble);
        capture
    }
}

/// Whether a non-target event climbs back up to `root`.
fn reaches_root_bubbling<D: Document>(doc: &D, event: &NativeEvent<D::Node>, root: D::Node) -> bool {
    if !event.bubbles {
        return false;
    }
    match event.stopped_at {
        None => true,
        Some(stop) if stop == root => true,
        Some(stop) => !is_inclusive_descendant(doc, stop, root),
    }
}

fn is_inclusive_descendant<D: Document>(doc: &D, mut node: D::Node, ancestor: D::Node) -> bool {
    loop {
        if node == ancestor {
            return true;
        }
        match doc.parent(node) {
            Some(parent) => node = parent,
            None => return false,
        }
    }
}
