// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute parser: turns prefixed element attributes into an event name and parameters.
//!
//! ## Grammar
//!
//! With prefix `data-t`:
//!
//! - `data-t="signup"` is the generic event name.
//! - `data-t-click="buy"` (also `focus`, `blur`, `hover`) names the event for one
//!   kind only.
//! - `data-t-item-id="42"` is a parameter, reported as `item_id`.
//!
//! `data-t-expose` only marks an element for exposure tracking. It names nothing and
//! is reported as an ordinary `expose` parameter; exposure events take the generic
//! name.
//!
//! An attribute participates when the prefix occurs in its name followed by the end
//! of the name or by `-`. So `data-track` is not a `data-t` attribute.
//!
//! ## Name resolution
//!
//! The generic name wins when it is non-empty, then the name for the firing kind,
//! else the name is empty. Naming attributes never appear in the parameters, whichever
//! kind they belong to.
//!
//! ```
//! use understory_instrument::attrs::extract;
//! use understory_instrument::EventKind;
//!
//! let attrs = [("data-t-click", "buy"), ("data-t-item-id", "42"), ("class", "btn")];
//! let ev = extract(attrs, "data-t", EventKind::Click);
//! assert_eq!(ev.name, "buy");
//! assert_eq!(ev.params.get("item_id").map(String::as_str), Some("42"));
//! assert_eq!(ev.params.len(), 1);
//! ```

use alloc::string::String;

use crate::event::{EventKind, Params};

/// Kinds whose naming attributes are reserved.
const NAMED_KINDS: [EventKind; 4] = [
    EventKind::Click,
    EventKind::Focus,
    EventKind::Blur,
    EventKind::Hover,
];

/// Parameter key of the bare-prefix attribute.
const GENERIC_KEY: &str = "";

/// Result of parsing an element's attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedEvent {
    /// Resolved event name, or empty.
    pub name: String,
    /// Non-reserved parameters.
    pub params: Params,
}

/// Parses `attributes` for `kind` under `prefix`.
///
/// Runs in time linear in the number of attributes and only reads its input.
pub fn extract<'a>(
    attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
    prefix: &str,
    kind: EventKind,
) -> ExtractedEvent {
    let mut params = Params::new();
    for (name, value) in attributes {
        if let Some(key) = attribute_key(name, prefix) {
            params.insert(key, String::from(value));
        }
    }

    let mut event_name = params.remove(GENERIC_KEY).unwrap_or_default();
    if event_name.is_empty()
        && NAMED_KINDS.contains(&kind)
        && let Some(value) = params.get(kind.attribute_suffix())
    {
        event_name.clone_from(value);
    }
    for other in NAMED_KINDS {
        params.remove(other.attribute_suffix());
    }

    ExtractedEvent {
        name: event_name,
        params,
    }
}

/// Maps an attribute name to its parameter key, or `None` if it is not prefixed.
///
/// The bare prefix maps to the empty key; dashes in the remainder become `_`.
#[must_use]
pub fn attribute_key(name: &str, prefix: &str) -> Option<String> {
    if prefix.is_empty() {
        return None;
    }
    let rest = name.match_indices(prefix).find_map(|(at, _)| {
        let rest = &name[at + prefix.len()..];
        if rest.is_empty() {
            Some(rest)
        } else {
            rest.strip_prefix('-')
        }
    })?;
    Some(field_name(rest))
}

/// Converts a dashed attribute remainder to a snake_case field name.
#[must_use]
pub fn field_name(dashed: &str) -> String {
    dashed
        .chars()
        .map(|c| if c == '-' { '_' } else { c.to_ascii_lowercase() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn p(ev: &ExtractedEvent) -> Vec<(&str, &str)> {
        ev.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn keys_follow_prefix_boundary() {
        assert_eq!(attribute_key("data-t", "data-t").as_deref(), Some(""));
        assert_eq!(attribute_key("data-t-foo", "data-t").as_deref(), Some("foo"));
        assert_eq!(
            attribute_key("data-t-user-id", "data-t").as_deref(),
            Some("user_id")
        );
        assert_eq!(attribute_key("data-track", "data-t"), None);
        assert_eq!(attribute_key("id", "data-t"), None);
        assert_eq!(attribute_key("anything", ""), None);
    }

    #[test]
    fn prefix_may_appear_after_a_namespace() {
        assert_eq!(
            attribute_key("x-data-t-foo", "data-t").as_deref(),
            Some("foo")
        );
    }

    #[test]
    fn later_boundary_match_is_used() {
        // First occurrence is not on a boundary; the second one is.
        assert_eq!(
            attribute_key("data-tx-data-t-k", "data-t").as_deref(),
            Some("k")
        );
    }

    #[test]
    fn generic_name_wins_over_kind_name() {
        let ev = extract(
            [("data-t", "generic"), ("data-t-click", "specific")],
            "data-t",
            EventKind::Click,
        );
        assert_eq!(ev.name, "generic");
        assert!(ev.params.is_empty());
    }

    #[test]
    fn empty_generic_falls_back_to_kind_name() {
        let ev = extract(
            [("data-t", ""), ("data-t-focus", "field")],
            "data-t",
            EventKind::Focus,
        );
        assert_eq!(ev.name, "field");
    }

    #[test]
    fn other_kind_names_are_not_used_but_are_removed() {
        let ev = extract(
            [("data-t-click", "buy"), ("data-t-hover", "peek"), ("data-t-a", "1")],
            "data-t",
            EventKind::Blur,
        );
        assert_eq!(ev.name, "");
        assert_eq!(p(&ev), [("a", "1")]);
    }

    #[test]
    fn empty_values_are_kept_as_empty_strings() {
        let ev = extract(
            [("data-t", ""), ("data-t-flag", "")],
            "data-t",
            EventKind::Click,
        );
        assert_eq!(ev.name, "");
        assert_eq!(p(&ev), [("flag", "")]);
    }

    #[test]
    fn unrelated_attributes_are_ignored() {
        let ev = extract(
            [("class", "x"), ("id", "y"), ("data-t-foo", "bar")],
            "data-t",
            EventKind::Click,
        );
        assert_eq!(p(&ev), [("foo", "bar")]);
    }

    #[test]
    fn expose_marker_is_an_ordinary_parameter() {
        let attrs = [("data-t-expose", "promo"), ("data-t-foo", "1")];
        let ev = extract(attrs, "data-t", EventKind::Click);
        assert_eq!(ev.name, "");
        assert_eq!(p(&ev), [("expose", "promo"), ("foo", "1")]);

        let ev = extract(attrs, "data-t", EventKind::Expose);
        assert_eq!(ev.name, "");
        assert_eq!(p(&ev), [("expose", "promo"), ("foo", "1")]);
    }

    #[test]
    fn exposure_takes_the_generic_name() {
        let ev = extract(
            [("data-t", "banner"), ("data-t-expose", ""), ("data-t-slot", "top")],
            "data-t",
            EventKind::Expose,
        );
        assert_eq!(ev.name, "banner");
        assert_eq!(p(&ev), [("expose", ""), ("slot", "top")]);
    }
}
