// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracker configuration.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::ConfigError;
use crate::event::{EventKind, EventKinds, NativeEventType};
use crate::router::Binding;
use crate::selector::Selector;

/// Configuration of one tracker instance. Fixed once the tracker is built.
///
/// With the `serde` feature, missing fields take their default values, so a partial
/// document is merged over [`TrackerConfig::default`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct TrackerConfig {
    /// Selector for the delegation root. `None`, or a selector that matches nothing,
    /// means the document root.
    pub root_selector: Option<String>,
    /// Prefix identifying tracked attributes.
    pub attribute_prefix: String,
    /// Coalescing window of the shared reporting gate, in milliseconds.
    pub debounce_wait_ms: u64,
    /// Continuous visibility required before an exposure fires, in milliseconds.
    pub expose_confirm_ms: u64,
    /// Visible-area ratio that arms exposure confirmation. `0` disables exposure.
    pub expose_threshold: f64,
    /// Period between watch-set refreshes, in milliseconds.
    pub watch_refresh_ms: u64,
    /// Interaction kinds that get delegated listeners.
    pub kinds: EventKinds,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            root_selector: None,
            attribute_prefix: String::from("data-t"),
            debounce_wait_ms: 300,
            expose_confirm_ms: 1000,
            expose_threshold: 0.5,
            watch_refresh_ms: 1000,
            kinds: EventKinds::all(),
        }
    }
}

impl TrackerConfig {
    /// Checks the configuration for values the tracker cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attribute_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if !(0.0..=1.0).contains(&self.expose_threshold) {
            return Err(ConfigError::InvalidThreshold(self.expose_threshold));
        }
        if self.watch_refresh_ms == 0 {
            return Err(ConfigError::InvalidRefreshPeriod);
        }
        Ok(())
    }

    /// Whether exposure tracking runs at all.
    #[must_use]
    pub fn exposure_enabled(&self) -> bool {
        self.expose_threshold > 0.0
    }

    /// Selector marking exposable elements: `[{prefix}-expose]`.
    #[must_use]
    pub fn expose_selector(&self) -> Selector {
        Selector::attribute(self.kind_attribute(EventKind::Expose))
    }

    /// Delegated listener bindings for the configured kinds.
    ///
    /// Click, focus and blur each listen for both the bare prefix and their own
    /// attribute; hover only for its own, on `mouseover`. Click listens in the bubble
    /// phase, the others in the capture phase.
    #[must_use]
    pub fn bindings(&self) -> Vec<Binding> {
        const TABLE: [(EventKinds, EventKind, NativeEventType, bool, bool); 4] = [
            (EventKinds::CLICK, EventKind::Click, NativeEventType::Click, false, true),
            (EventKinds::FOCUS, EventKind::Focus, NativeEventType::Focus, true, true),
            (EventKinds::BLUR, EventKind::Blur, NativeEventType::Blur, true, true),
            (EventKinds::HOVER, EventKind::Hover, NativeEventType::MouseOver, true, false),
        ];

        let mut out = Vec::new();
        for (flag, kind, ty, capture, generic) in TABLE {
            if !self.kinds.contains(flag) {
                continue;
            }
            if generic {
                out.push(Binding {
                    selector: Selector::attribute(self.attribute_prefix.clone()),
                    ty,
                    kind,
                    capture,
                });
            }
            out.push(Binding {
                selector: Selector::attribute(self.kind_attribute(kind)),
                ty,
                kind,
                capture,
            });
        }
        out
    }

    fn kind_attribute(&self, kind: EventKind) -> String {
        format!("{}-{}", self.attribute_prefix, kind.attribute_suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TrackerConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert!(config.exposure_enabled());
        assert_eq!(config.expose_selector(), Selector::attribute("data-t-expose"));
    }

    #[test]
    fn validation_errors() {
        let mut config = TrackerConfig {
            attribute_prefix: String::new(),
            ..TrackerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyPrefix));

        config.attribute_prefix = "data-t".into();
        config.expose_threshold = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::InvalidThreshold(1.5)));
        config.expose_threshold = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreshold(_))));

        config.expose_threshold = 0.0;
        config.watch_refresh_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidRefreshPeriod));
    }

    #[test]
    fn zero_threshold_disables_exposure() {
        let config = TrackerConfig {
            expose_threshold: 0.0,
            ..TrackerConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
        assert!(!config.exposure_enabled());
    }

    #[test]
    fn binding_table() {
        let bindings = TrackerConfig::default().bindings();
        let summary: Vec<_> = bindings
            .iter()
            .map(|b| (b.selector.clone(), b.ty, b.capture))
            .collect();
        assert_eq!(
            summary,
            [
                (Selector::attribute("data-t"), NativeEventType::Click, false),
                (Selector::attribute("data-t-click"), NativeEventType::Click, false),
                (Selector::attribute("data-t"), NativeEventType::Focus, true),
                (Selector::attribute("data-t-focus"), NativeEventType::Focus, true),
                (Selector::attribute("data-t"), NativeEventType::Blur, true),
                (Selector::attribute("data-t-blur"), NativeEventType::Blur, true),
                (Selector::attribute("data-t-hover"), NativeEventType::MouseOver, true),
            ]
        );
    }

    #[test]
    fn kinds_filter_bindings() {
        let config = TrackerConfig {
            kinds: EventKinds::HOVER | EventKinds::BLUR,
            ..TrackerConfig::default()
        };
        let kinds: Vec<_> = config.bindings().iter().map(|b| b.kind).collect();
        assert_eq!(kinds, [EventKind::Blur, EventKind::Blur, EventKind::Hover]);
        let none = TrackerConfig {
            kinds: EventKinds::empty(),
            ..TrackerConfig::default()
        };
        assert!(none.bindings().is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_documents_merge_over_defaults() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{ "attribute_prefix": "data-x", "debounce_wait_ms": 0 }"#)
                .unwrap();
        assert_eq!(config.attribute_prefix, "data-x");
        assert_eq!(config.debounce_wait_ms, 0);
        assert_eq!(config.expose_confirm_ms, 1000);
        assert_eq!(config.kinds, EventKinds::all());

        let text = serde_json::to_string(&config).unwrap();
        let back: TrackerConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
