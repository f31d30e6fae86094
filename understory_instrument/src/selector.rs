// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element selectors for delegation roots and attribute bindings.
//!
//! Selectors are single-element predicates (no combinators), optionally grouped
//! into a comma-separated list.
//!
//! Supported simple selectors:
//!
//! - `div`, `*`: tag (case-insensitive)
//! - `#main`: id
//! - `.card`: class
//! - `[data-t]`: attribute presence
//! - `[data-t="x"]`, `[data-t=x]`: exact attribute value
//!
//! ```
//! use understory_instrument::Selector;
//!
//! let sel: Selector = "section#feed.card[data-t-expose], [data-t]".parse().unwrap();
//! assert_eq!(sel.alternatives().len(), 2);
//! assert!("div > p".parse::<Selector>().is_err());
//! ```

use alloc::string::String;
use core::str::FromStr;

use smallvec::SmallVec;

use crate::document::Document;
use crate::error::SelectorError;

/// An attribute predicate: presence, or exact value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeMatch {
    /// Attribute name.
    pub name: String,
    /// Required value; `None` tests presence only.
    pub value: Option<String>,
}

/// A compound selector: every part must match the same element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compound {
    /// Tag name; `None` matches any tag.
    pub tag: Option<String>,
    /// Required id.
    pub id: Option<String>,
    /// Required classes.
    pub classes: SmallVec<[String; 2]>,
    /// Required attributes.
    pub attributes: SmallVec<[AttributeMatch; 2]>,
}

impl Compound {
    /// Returns `true` if `node` satisfies every part of this compound.
    pub fn matches<D: Document>(&self, doc: &D, node: D::Node) -> bool {
        if let Some(tag) = &self.tag
            && !doc.tag_name(node).eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && doc.attribute(node, "id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.is_empty() {
            let class_attr = doc.attribute(node, "class").unwrap_or("");
            if !self
                .classes
                .iter()
                .all(|c| class_attr.split_ascii_whitespace().any(|have| have == c))
            {
                return false;
            }
        }
        self.attributes
            .iter()
            .all(|a| match (doc.attribute(node, &a.name), &a.value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(have), Some(want)) => have == want,
            })
    }
}

/// A selector list; matches when any alternative matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    alternatives: SmallVec<[Compound; 1]>,
}

impl Selector {
    /// Attribute-presence selector, `[name]`.
    pub fn attribute(name: impl Into<String>) -> Self {
        let compound = Compound {
            attributes: smallvec::smallvec![AttributeMatch {
                name: name.into(),
                value: None,
            }],
            ..Compound::default()
        };
        Self {
            alternatives: smallvec::smallvec![compound],
        }
    }

    /// Parses a selector list.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut alternatives = SmallVec::new();
        let mut offset = 0;
        for part in input.split(',') {
            let lead = part.len() - part.trim_start().len();
            alternatives.push(parse_compound(part.trim(), offset + lead)?);
            offset += part.len() + 1;
        }
        Ok(Self { alternatives })
    }

    /// The compound selectors of this list.
    #[must_use]
    pub fn alternatives(&self) -> &[Compound] {
        &self.alternatives
    }

    /// Returns `true` if `node` matches any alternative.
    pub fn matches<D: Document>(&self, doc: &D, node: D::Node) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, node))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Parses one compound; `base` is its byte offset in the original input.
fn parse_compound(src: &str, base: usize) -> Result<Compound, SelectorError> {
    if src.is_empty() {
        return Err(SelectorError::Empty);
    }
    if src.contains(|c: char| c.is_whitespace() || c == '>' || c == '+' || c == '~') {
        // Whitespace inside a quoted attribute value is fine; anything else is a combinator.
        if has_combinator_outside_brackets(src) {
            return Err(SelectorError::UnsupportedCombinator(String::from(src)));
        }
    }

    let mut out = Compound::default();
    let bytes = src.as_bytes();
    let mut i = 0;

    if src.starts_with('*') {
        i = 1;
    } else {
        let end = ident_end(src, 0);
        if end > 0 {
            out.tag = Some(src[..end].to_ascii_lowercase());
            i = end;
        }
    }

    while i < bytes.len() {
        let c = src[i..].chars().next().unwrap_or_default();
        match c {
            '#' | '.' => {
                let end = ident_end(src, i + 1);
                if end == i + 1 {
                    return Err(unexpected(src, i + 1, base));
                }
                let ident = String::from(&src[i + 1..end]);
                if c == '#' {
                    out.id = Some(ident);
                } else {
                    out.classes.push(ident);
                }
                i = end;
            }
            '[' => {
                let (attr, next) = parse_attribute(src, i + 1, base)?;
                out.attributes.push(attr);
                i = next;
            }
            _ => return Err(unexpected(src, i, base)),
        }
    }
    Ok(out)
}

/// Parses the inside of `[...]` starting after the `[`; returns the byte after `]`.
fn parse_attribute(
    src: &str,
    start: usize,
    base: usize,
) -> Result<(AttributeMatch, usize), SelectorError> {
    let name_end = ident_end(src, start);
    if name_end == start {
        return match src[start..].chars().next() {
            Some(_) => Err(unexpected(src, start, base)),
            None => Err(SelectorError::UnterminatedAttribute),
        };
    }
    let name = String::from(&src[start..name_end]);
    let rest = &src[name_end..];

    if let Some(after) = rest.strip_prefix(']') {
        let next = src.len() - after.len();
        return Ok((AttributeMatch { name, value: None }, next));
    }
    let Some(value_src) = rest.strip_prefix('=') else {
        return match rest.chars().next() {
            Some(_) => Err(unexpected(src, name_end, base)),
            None => Err(SelectorError::UnterminatedAttribute),
        };
    };

    let value_start = src.len() - value_src.len();
    let (value, after_value) = match value_src.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let body = &value_src[1..];
            let close = body.find(q).ok_or(SelectorError::UnterminatedAttribute)?;
            (String::from(&body[..close]), value_start + 1 + close + 1)
        }
        _ => {
            let end = ident_end(src, value_start);
            if end == value_start {
                return Err(match src[value_start..].chars().next() {
                    Some(_) => unexpected(src, value_start, base),
                    None => SelectorError::UnterminatedAttribute,
                });
            }
            (String::from(&src[value_start..end]), end)
        }
    };
    if !src[after_value..].starts_with(']') {
        return Err(SelectorError::UnterminatedAttribute);
    }
    Ok((
        AttributeMatch {
            name,
            value: Some(value),
        },
        after_value + 1,
    ))
}

fn ident_end(src: &str, start: usize) -> usize {
    src[start..]
        .char_indices()
        .find(|&(_, c)| !is_ident_char(c))
        .map_or(src.len(), |(at, _)| start + at)
}

fn unexpected(src: &str, at: usize, base: usize) -> SelectorError {
    SelectorError::UnexpectedChar {
        ch: src[at..].chars().next().unwrap_or_default(),
        at: base + at,
    }
}

fn has_combinator_outside_brackets(src: &str) -> bool {
    let mut quote = None;
    let mut depth = 0_u32;
    for c in src.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if depth == 0 && (c.is_whitespace() || matches!(c, '>' | '+' | '~')) => {
                return true;
            }
            (None, _) => {}
        }
    }
    false
}
