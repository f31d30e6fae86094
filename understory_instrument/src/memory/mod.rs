// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory document and viewport observer.
//!
//! ## Feature
//!
//! Enable with `memory` (on by default).
//!
//! ## Notes
//!
//! [`MemoryDocument`] is a plain element arena with generational ids, attributes,
//! and a world-space bounding box per element. Layout is the host's business: it
//! sets boxes with [`MemoryDocument::set_bounds`] after computing them.
//!
//! [`ViewportObserver`] computes visible ratios of those boxes against a viewport
//! rectangle with Kurbo, and produces records the way an intersection observer does:
//! one on first observation, then one whenever the set of crossed thresholds
//! changes.
//!
//! Together they let the whole instrumentation run headless.

mod document;
mod observer;

pub use document::{AttributeIter, ElementId, MemoryDocument};
pub use observer::ViewportObserver;
