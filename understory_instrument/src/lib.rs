// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_instrument --heading-base-level=0

//! Understory Instrument: attribute-driven interaction and exposure tracking.
//!
//! ## Overview
//!
//! Elements opt into tracking with prefixed attributes. With the default prefix
//! `data-t`:
//!
//! ```html
//! <button data-t-click="buy" data-t-item-id="42">Buy</button>
//! <section data-t="promo" data-t-expose data-t-slot="top">…</section>
//! ```
//!
//! A [`Tracker`] reports `("buy", {item_id: "42"}, "click")` when the button is
//! clicked, and `("promo", {expose: "", slot: "top"}, "expose")` once the section has
//! stayed on screen long enough. `data-t-expose` marks the section for exposure
//! tracking; the exposure is named by the generic `data-t` attribute.
//!
//! ## Pieces
//!
//! - [`attrs`]: parses an element's attributes into an event name and parameters.
//! - [`router`]: delegated listeners on one root, matched by selector from the
//!   event target upward.
//! - [`ExposureTracker`]: per-element `Unobserved → Armed → Confirmed` state machine
//!   over a periodically refreshed watch set.
//! - [`Tracker`]: composes the above behind one [`TrackerConfig`], with every outgoing
//!   event passed through a single [`Debouncer`](understory_timing::Debouncer).
//!
//! ## Capabilities
//!
//! Nothing here touches a real DOM or clock. The host supplies:
//!
//! - a [`Document`]: tree shape and attributes,
//! - a [`VisibilityObserver`]: visible ratios of observed elements,
//! - an [`EventSink`]: where events go (any `FnMut(&str, &Params, &str)` works),
//! - timestamps in milliseconds on every call.
//!
//! The `memory` feature (on by default) provides [`memory::MemoryDocument`] and a
//! Kurbo-backed [`memory::ViewportObserver`] for headless hosts and tests.
//!
//! ## Example
//!
//! ```
//! use kurbo::Rect;
//! use understory_instrument::memory::{MemoryDocument, ViewportObserver};
//! use understory_instrument::{Document, EventLog, NativeEvent, TrackerBuilder, TrackerConfig};
//!
//! let mut doc = MemoryDocument::new();
//! let button = doc.append_new(doc.root(), "button", &[("data-t", ""), ("data-t-foo", "1")]);
//! let promo = doc.append_new(doc.root(), "section", &[("data-t", "promo"), ("data-t-expose", "")]);
//! doc.set_bounds(promo, Rect::new(0.0, 0.0, 100.0, 40.0));
//!
//! let config = TrackerConfig {
//!     debounce_wait_ms: 0,
//!     ..TrackerConfig::default()
//! };
//! let mut tracker = TrackerBuilder::new(config)
//!     .sink(EventLog::new())
//!     .observer(ViewportObserver::new(Rect::new(0.0, 0.0, 100.0, 100.0), [0.5]))
//!     .init(&doc, 0)
//!     .unwrap();
//!
//! tracker.handle_event(&doc, &NativeEvent::click(button), 0);
//! tracker.tick(&doc, 0);
//!
//! let click = &tracker.sink().events()[0];
//! assert_eq!(click.name, "");
//! assert_eq!(click.params.get("foo").map(String::as_str), Some("1"));
//! assert_eq!(click.kind.as_str(), "click");
//!
//! // The promo has been fully visible since t = 0; it is confirmed after one second.
//! tracker.tick(&doc, 1000);
//! let expose = &tracker.sink().events()[1];
//! assert_eq!((expose.name.as_str(), expose.kind.as_str()), ("promo", "expose"));
//!
//! tracker.destroy();
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod attrs;
mod config;
pub mod document;
mod error;
mod event;
mod exposure;
#[cfg(feature = "memory")]
pub mod memory;
pub mod router;
mod selector;
mod sink;
mod tracker;
mod visibility;

pub use config::TrackerConfig;
pub use document::Document;
pub use error::{ConfigError, SelectorError, SinkError};
pub use event::{EventKind, EventKinds, NativeEvent, NativeEventType, Params, TrackedEvent};
pub use exposure::{Confirm, ExposureState, ExposureTracker, RefreshDiff};
pub use selector::{AttributeMatch, Compound, Selector};
pub use sink::{EventLog, EventSink};
pub use tracker::{NoObserver, NoSink, Tracker, TrackerBuilder};
pub use visibility::{Containment, VisibilityEntry, VisibilityObserver};
