// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event vocabulary: tracked kinds, native input events, and reported payloads.

use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt;

/// Extracted event parameters, keyed by snake_case field name.
///
/// Ordered so that reported payloads are deterministic.
pub type Params = BTreeMap<String, String>;

/// The kind of a tracked event, reported to the sink by its canonical name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Pointer activation.
    Click,
    /// Element received focus.
    Focus,
    /// Element lost focus.
    Blur,
    /// Pointer entered the element (native `mouseover`).
    Hover,
    /// Sustained on-screen visibility.
    Expose,
}

impl EventKind {
    /// Canonical name passed to the sink as the event type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Hover => "hover",
            Self::Expose => "expose",
        }
    }

    /// Attribute suffix that names an event of this kind (`{prefix}-{suffix}`).
    #[must_use]
    pub const fn attribute_suffix(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags::bitflags! {
    /// Set of interaction kinds that get delegated listeners.
    ///
    /// Exposure is governed separately by the exposure threshold.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(
        feature = "serde",
        derive(serde::Serialize, serde::Deserialize),
        serde(transparent)
    )]
    pub struct EventKinds: u8 {
        /// Track clicks.
        const CLICK = 0b0000_0001;
        /// Track focus.
        const FOCUS = 0b0000_0010;
        /// Track blur.
        const BLUR  = 0b0000_0100;
        /// Track hover.
        const HOVER = 0b0000_1000;
    }
}

impl Default for EventKinds {
    fn default() -> Self {
        Self::all()
    }
}

/// Native input event types the router listens for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NativeEventType {
    /// `click`
    Click,
    /// `focus`
    Focus,
    /// `blur`
    Blur,
    /// `mouseover`
    MouseOver,
}

impl NativeEventType {
    /// The DOM event type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::MouseOver => "mouseover",
        }
    }

    /// Parses a DOM event type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "click" => Some(Self::Click),
            "focus" => Some(Self::Focus),
            "blur" => Some(Self::Blur),
            "mouseover" => Some(Self::MouseOver),
            _ => None,
        }
    }

    /// Whether events of this type bubble by default.
    #[must_use]
    pub const fn bubbles(self) -> bool {
        matches!(self, Self::Click | Self::MouseOver)
    }
}

/// One native event as delivered to the delegation root.
///
/// `stopped_at` records the element whose handler stopped propagation, if any.
/// Capture listeners on the root run before any descendant handler and are not
/// affected by it; bubble listeners on the root never see a stopped event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NativeEvent<K> {
    /// Event type.
    pub ty: NativeEventType,
    /// Original target element.
    pub target: K,
    /// Whether this event bubbles.
    pub bubbles: bool,
    /// Element at which propagation was stopped during target or bubble phase.
    pub stopped_at: Option<K>,
}

impl<K> NativeEvent<K> {
    /// An event of type `ty` on `target`, bubbling per the type's default.
    #[must_use]
    pub fn new(ty: NativeEventType, target: K) -> Self {
        Self {
            ty,
            target,
            bubbles: ty.bubbles(),
            stopped_at: None,
        }
    }

    /// Shorthand for a `click` on `target`.
    #[must_use]
    pub fn click(target: K) -> Self {
        Self::new(NativeEventType::Click, target)
    }

    /// Marks propagation as stopped by a handler on `node`.
    #[must_use]
    pub fn stopped_at(mut self, node: K) -> Self {
        self.stopped_at = Some(node);
        self
    }

    /// Overrides whether the event bubbles.
    #[must_use]
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }
}

/// A normalized event ready for reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedEvent {
    /// Resolved event name; empty when no naming attribute was set.
    pub name: String,
    /// Remaining parameters.
    pub params: Params,
    /// Event kind.
    pub kind: EventKind,
}
