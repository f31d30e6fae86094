// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instrumentation basics.
//!
//! Build a small page in memory, track clicks and exposures on it, scroll the
//! viewport, and print what the sink receives.
//!
//! Run:
//! - `cargo run -p understory_examples --example instrument_basics`
//! - `RUST_LOG=understory_instrument=trace cargo run -p understory_examples --example instrument_basics`

use kurbo::Rect;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use understory_instrument::memory::{MemoryDocument, ViewportObserver};
use understory_instrument::{Document, NativeEvent, Params, TrackerBuilder, TrackerConfig};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // A partial configuration merged over the defaults.
    let config: TrackerConfig = serde_json::from_str(
        r##"{ "root_selector": "#app", "debounce_wait_ms": 50, "expose_confirm_ms": 500 }"##,
    )
    .expect("valid configuration");
    println!("config: {config:?}");

    let mut doc = MemoryDocument::new();
    let app = doc.append_new(doc.root(), "main", &[("id", "app")]);
    let hero = doc.append_new(
        app,
        "section",
        &[
            ("data-t", "hero"),
            ("data-t-expose", ""),
            ("data-t-campaign", "spring"),
        ],
    );
    doc.set_bounds(hero, Rect::new(0.0, 0.0, 800.0, 400.0));
    let footer = doc.append_new(app, "footer", &[("data-t", "footer"), ("data-t-expose", "")]);
    doc.set_bounds(footer, Rect::new(0.0, 1800.0, 800.0, 2000.0));
    let buy = doc.append_new(
        hero,
        "button",
        &[("data-t-click", "buy"), ("data-t-product-id", "42")],
    );
    let label = doc.append_new(buy, "span", &[]);

    let sink = |name: &str, params: &Params, kind: &str| {
        println!("  -> {kind:<6} {name:?} {params:?}");
    };
    let mut tracker = TrackerBuilder::new(config)
        .sink(sink)
        .observer(ViewportObserver::new(Rect::new(0.0, 0.0, 800.0, 600.0), [0.5]))
        .init(&doc, 0)
        .expect("tracker starts");

    println!("t=0     click on the button label");
    tracker.handle_event(&doc, &NativeEvent::click(label), 0);

    for now in (100..=1000).step_by(100) {
        tracker.tick(&doc, now);
    }

    println!("t=1000  scroll to the bottom");
    if let Some(observer) = tracker.observer_mut() {
        observer.set_viewport(Rect::new(0.0, 1500.0, 800.0, 2100.0));
    }
    for now in (1100..=3000).step_by(100) {
        tracker.tick(&doc, now);
    }

    println!("t=3000  append a late banner in view");
    let banner = doc.append_new(app, "aside", &[("data-t", "late-banner"), ("data-t-expose", "")]);
    doc.set_bounds(banner, Rect::new(0.0, 1600.0, 400.0, 1700.0));
    while let Some(next) = tracker.next_deadline() {
        if next > 6000 {
            break;
        }
        tracker.tick(&doc, next);
    }

    tracker.destroy();
    println!("destroyed; next deadline: {:?}", tracker.next_deadline());
}
