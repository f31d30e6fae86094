// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exposure tracking through the facade, with the Kurbo viewport observer.

use kurbo::Rect;
use understory_instrument::document::query_selector_all;
use understory_instrument::memory::{ElementId, MemoryDocument, ViewportObserver};
use understory_instrument::{
    ConfigError, Document, EventKind, EventLog, ExposureState, NativeEvent, Selector, Tracker,
    TrackerBuilder, TrackerConfig,
};

const VIEW: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);
const AWAY: Rect = Rect::new(0.0, 1000.0, 100.0, 1100.0);

type TestTracker = Tracker<MemoryDocument, EventLog, ViewportObserver>;

fn config() -> TrackerConfig {
    TrackerConfig {
        debounce_wait_ms: 0,
        expose_confirm_ms: 100,
        watch_refresh_ms: 50,
        ..TrackerConfig::default()
    }
}

fn start(doc: &MemoryDocument, config: TrackerConfig) -> TestTracker {
    TrackerBuilder::new(config)
        .sink(EventLog::new())
        .observer(ViewportObserver::new(VIEW, [0.5]))
        .init(doc, 0)
        .unwrap()
}

fn card(doc: &mut MemoryDocument, name: &str, bounds: Rect) -> ElementId {
    let el = doc.append_new(
        doc.root(),
        "div",
        &[("data-t", name), ("data-t-expose", ""), ("data-t-slot", "top")],
    );
    doc.set_bounds(el, bounds);
    el
}

fn scroll(tracker: &mut TestTracker, viewport: Rect) {
    if let Some(observer) = tracker.observer_mut() {
        observer.set_viewport(viewport);
    }
}

fn exposures(tracker: &TestTracker) -> Vec<&str> {
    tracker
        .sink()
        .events()
        .iter()
        .filter(|e| e.kind == EventKind::Expose)
        .map(|e| e.name.as_str())
        .collect()
}

#[test]
fn visible_element_fires_once_after_confirmation() {
    let mut doc = MemoryDocument::new();
    let promo = card(&mut doc, "promo", Rect::new(0.0, 0.0, 100.0, 60.0));
    let mut tracker = start(&doc, config());

    tracker.tick(&doc, 0);
    assert_eq!(tracker.exposure_state(promo), ExposureState::Armed);
    tracker.tick(&doc, 99);
    assert!(tracker.sink().events().is_empty());

    tracker.tick(&doc, 100);
    assert_eq!(tracker.exposure_state(promo), ExposureState::Confirmed);
    let events = tracker.sink().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "promo");
    assert_eq!(events[0].params.get("slot").map(String::as_str), Some("top"));
    assert_eq!(events[0].params.get("expose").map(String::as_str), Some(""));
    assert_eq!(events[0].kind.as_str(), "expose");

    // Staying on screen does not fire again.
    tracker.tick(&doc, 5_000);
    assert_eq!(exposures(&tracker), ["promo"]);
}

#[test]
fn below_threshold_never_arms() {
    let mut doc = MemoryDocument::new();
    let strip = card(&mut doc, "strip", Rect::new(0.0, 80.0, 100.0, 180.0));
    let mut tracker = start(&doc, config());

    tracker.tick(&doc, 1_000);
    assert_eq!(tracker.exposure_state(strip), ExposureState::Unobserved);
    assert!(tracker.sink().events().is_empty());
}

#[test]
fn removal_before_confirmation_cancels() {
    // Noticed by the next refresh.
    let mut doc = MemoryDocument::new();
    let a = card(&mut doc, "a", VIEW);
    let mut tracker = start(&doc, config());
    tracker.tick(&doc, 0);
    doc.remove(a);
    tracker.tick(&doc, 1_000);
    assert!(tracker.sink().events().is_empty());
    assert_eq!(tracker.watched_len(), 0);

    // Noticed by the re-check at expiry, before any refresh.
    let mut doc = MemoryDocument::new();
    let b = card(&mut doc, "b", VIEW);
    let mut tracker = start(
        &doc,
        TrackerConfig {
            watch_refresh_ms: 60_000,
            ..config()
        },
    );
    tracker.tick(&doc, 0);
    doc.remove(b);
    tracker.tick(&doc, 100);
    assert!(tracker.sink().events().is_empty());
    assert_eq!(tracker.exposure_state(b), ExposureState::Unobserved);
}

#[test]
fn scrolled_away_before_expiry_does_not_fire() {
    let mut doc = MemoryDocument::new();
    card(&mut doc, "gone", VIEW);
    let mut tracker = start(&doc, config());
    tracker.tick(&doc, 0);
    scroll(&mut tracker, AWAY);
    tracker.tick(&doc, 200);
    assert!(tracker.sink().events().is_empty());
}

#[test]
fn partially_visible_at_expiry_still_fires() {
    // A record below the threshold does not cancel the armed timer; the expiry
    // re-check accepts partial visibility.
    let mut doc = MemoryDocument::new();
    let el = card(&mut doc, "sliver", VIEW);
    let mut tracker = start(&doc, config());
    tracker.tick(&doc, 0);

    scroll(&mut tracker, Rect::new(0.0, 70.0, 100.0, 170.0));
    tracker.tick(&doc, 40);
    assert_eq!(tracker.exposure_state(el), ExposureState::Armed);

    tracker.tick(&doc, 100);
    assert_eq!(exposures(&tracker), ["sliver"]);
}

#[test]
fn repeated_visibility_refires() {
    let mut doc = MemoryDocument::new();
    let el = card(&mut doc, "banner", Rect::new(0.0, 0.0, 100.0, 50.0));
    let mut tracker = start(&doc, config());

    tracker.tick(&doc, 0);
    tracker.tick(&doc, 100);
    scroll(&mut tracker, AWAY);
    tracker.tick(&doc, 150);
    assert_eq!(tracker.exposure_state(el), ExposureState::Unobserved);

    scroll(&mut tracker, VIEW);
    tracker.tick(&doc, 200);
    assert_eq!(tracker.exposure_state(el), ExposureState::Armed);
    tracker.tick(&doc, 300);
    assert_eq!(exposures(&tracker), ["banner", "banner"]);
}

#[test]
fn watch_set_converges_within_one_refresh() {
    let mut doc = MemoryDocument::new();
    let first = card(&mut doc, "1", AWAY);
    let mut tracker = start(&doc, config());
    assert_eq!(tracker.watched_len(), 1);

    let second = card(&mut doc, "2", AWAY);
    let nested_parent = doc.append_new(doc.root(), "section", &[]);
    let nested = doc.append_new(nested_parent, "div", &[("data-t-expose", "")]);
    doc.remove(first);
    doc.set_attribute(second, "data-t-expose", "renamed");

    tracker.tick(&doc, 50);
    let live = query_selector_all(&doc, &Selector::attribute("data-t-expose"));
    assert_eq!(live, [second, nested]);
    assert_eq!(tracker.watched_len(), live.len());
    assert_eq!(tracker.exposure_state(first), ExposureState::Unobserved);

    doc.delete(nested_parent);
    doc.remove_attribute(second, "data-t-expose");
    tracker.tick(&doc, 100);
    assert_eq!(tracker.watched_len(), 0);
}

#[test]
fn click_and_exposure_share_one_debounce_window() {
    let mut doc = MemoryDocument::new();
    card(&mut doc, "promo", VIEW);
    let button = doc.append_new(doc.root(), "button", &[("data-t-click", "buy")]);
    let mut tracker = start(
        &doc,
        TrackerConfig {
            debounce_wait_ms: 300,
            ..config()
        },
    );

    tracker.tick(&doc, 0);
    tracker.handle_event(&doc, &NativeEvent::click(button), 50);
    assert_eq!(tracker.pending_event().map(|e| e.name.as_str()), Some("buy"));

    // Confirmation at 100 supersedes the click still waiting for its window.
    tracker.tick(&doc, 100);
    assert_eq!(tracker.pending_event().map(|e| e.name.as_str()), Some("promo"));
    tracker.tick(&doc, 1_000);

    let kinds: Vec<_> = tracker.sink().events().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, [EventKind::Expose]);
}

#[test]
fn zero_threshold_installs_no_observation() {
    let mut doc = MemoryDocument::new();
    card(&mut doc, "x", VIEW);
    let mut tracker = start(
        &doc,
        TrackerConfig {
            expose_threshold: 0.0,
            ..config()
        },
    );
    assert!(!tracker.exposure_enabled());
    assert_eq!(tracker.next_deadline(), None);
    tracker.tick(&doc, 10_000);
    assert!(tracker.sink().events().is_empty());
    assert_eq!(tracker.observer_mut().map(|o| o.observed_len()), Some(0));
}

#[test]
fn missing_observer_keeps_interaction_tracking() {
    let mut doc = MemoryDocument::new();
    card(&mut doc, "x", VIEW);
    let button = doc.append_new(doc.root(), "button", &[("data-t-click", "buy")]);
    let mut tracker = TrackerBuilder::new(config())
        .sink(EventLog::new())
        .init(&doc, 0)
        .unwrap();

    assert!(!tracker.exposure_enabled());
    tracker.handle_event(&doc, &NativeEvent::click(button), 0);
    tracker.tick(&doc, 10_000);
    let names: Vec<_> = tracker.sink().events().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["buy"]);
}

#[test]
fn destroy_cancels_pending_confirmation() {
    let mut doc = MemoryDocument::new();
    card(&mut doc, "late", VIEW);
    let mut tracker = start(&doc, config());
    tracker.tick(&doc, 0);

    tracker.destroy();
    tracker.destroy();
    tracker.tick(&doc, 10_000);
    assert!(tracker.sink().events().is_empty());
    assert_eq!(tracker.observer_mut().map(|o| o.observed_len()), Some(0));
}

#[test]
fn observer_must_report_at_the_exposure_threshold() {
    let mut doc = MemoryDocument::new();
    card(&mut doc, "promo", Rect::new(0.0, 70.0, 100.0, 170.0));

    let mismatched = TrackerBuilder::new(config())
        .sink(EventLog::new())
        .observer(ViewportObserver::new(VIEW, [0.0]))
        .init(&doc, 0);
    assert_eq!(mismatched.err(), Some(ConfigError::ObserverThreshold(0.5)));

    // Without exposure tracking the observer's thresholds do not matter.
    let tracker = TrackerBuilder::new(TrackerConfig {
        expose_threshold: 0.0,
        ..config()
    })
    .sink(EventLog::new())
    .observer(ViewportObserver::new(VIEW, [0.25]))
    .init(&doc, 0);
    assert!(tracker.is_ok_and(|t| !t.exposure_enabled()));

    let mut tracker = TrackerBuilder::new(config())
        .sink(EventLog::new())
        .observer(ViewportObserver::new(VIEW, [0.0, 0.5, 1.0]))
        .init(&doc, 0)
        .unwrap();
    tracker.tick(&doc, 0);
    scroll(&mut tracker, Rect::new(0.0, 70.0, 100.0, 170.0));
    tracker.tick(&doc, 10);
    tracker.tick(&doc, 5_000);
    assert_eq!(exposures(&tracker), ["promo"]);
}
