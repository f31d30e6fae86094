// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use alloc::string::String;

use thiserror::Error;

/// Invalid tracker configuration. Returned by [`TrackerBuilder::init`](crate::TrackerBuilder::init);
/// when this happens nothing is attached and nothing is observed.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The attribute prefix is empty, so every attribute would match.
    #[error("attribute prefix must not be empty")]
    EmptyPrefix,
    /// No reporting sink was supplied.
    #[error("an event sink is required")]
    MissingSink,
    /// The exposure threshold is not a ratio in `[0, 1]`.
    #[error("exposure threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),
    /// The visibility observer never reports at the exposure threshold, so no element
    /// could ever arm.
    #[error("visibility observer does not report at the exposure threshold {0}")]
    ObserverThreshold(f64),
    /// The watch refresh period is zero.
    #[error("watch refresh period must be greater than zero")]
    InvalidRefreshPeriod,
}

/// A selector string that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The selector (or one alternative of a list) is empty.
    #[error("empty selector")]
    Empty,
    /// A character that is not part of the supported grammar.
    #[error("unexpected {ch:?} at byte {at}")]
    UnexpectedChar {
        /// Offending character.
        ch: char,
        /// Byte offset in the input.
        at: usize,
    },
    /// An attribute selector without its closing `]` or closing quote.
    #[error("unterminated attribute selector")]
    UnterminatedAttribute,
    /// Descendant and child combinators are not supported.
    #[error("combinators are not supported: {0:?}")]
    UnsupportedCombinator(String),
}

/// Failure reported by an [`EventSink`](crate::EventSink).
///
/// The tracker logs it and drops the event; the listener stays attached.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("event sink failed: {0}")]
pub struct SinkError(pub String);

impl SinkError {
    /// Creates a sink error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
