#![forbid(unsafe_code)]

//! Structured logging integration tests.
//!
//! A capture layer records every event and span the viewer emits so tests
//! can assert on levels, messages and fields rather than formatted text.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use core::time::Duration;

use lifeview_core::config::ViewerConfig;
use lifeview_core::harness::SimulatedHost;
use lifeview_core::surface::RasterSurface;
use lifeview_core::viewer::Viewer;
use lifeview_core::viewport::WindowMetrics;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn message(&self) -> &str {
        self.fields.get("message").map_or("", String::as_str)
    }
}

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Default)]
struct Captured {
    events: Vec<CapturedEvent>,
    spans: Vec<CapturedSpan>,
}

struct CaptureLayer {
    sink: Arc<Mutex<Captured>>,
}

struct FieldVisitor(HashMap<String, String>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CaptureLayer {
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(HashMap::new());
        attrs.record(&mut visitor);
        self.sink.lock().unwrap().spans.push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0,
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(HashMap::new());
        event.record(&mut visitor);
        self.sink.lock().unwrap().events.push(CapturedEvent {
            level: *event.metadata().level(),
            fields: visitor.0,
        });
    }
}

fn capture<R>(f: impl FnOnce() -> R) -> (R, Captured) {
    let sink = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry().with(CaptureLayer {
        sink: Arc::clone(&sink),
    });
    let out = tracing::subscriber::with_default(subscriber, f);
    let captured = std::mem::take(&mut *sink.lock().unwrap());
    (out, captured)
}

fn host() -> SimulatedHost<RasterSurface> {
    let viewer = Viewer::new(
        RasterSurface::new(1, 1),
        WindowMetrics::new(640.0, 480.0, Some(2.0)),
        ViewerConfig::default(),
    )
    .unwrap();
    SimulatedHost::new(viewer)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn calibration_logs_buffer_geometry() {
    let (_, captured) = capture(host);
    let calibrated = captured
        .events
        .iter()
        .find(|e| e.level == Level::INFO && e.fields.contains_key("buffer_width"))
        .expect("calibration event");
    assert_eq!(calibrated.fields["buffer_width"], "1280");
    assert_eq!(calibrated.fields["buffer_height"], "960");
}

#[test]
fn join_failure_is_an_error_with_reason() {
    let mut h = host();
    let (_, captured) = capture(|| {
        h.viewer_mut().connect().unwrap();
        h.viewer_mut().join_error("unmatched topic")
    });
    let failure = captured
        .events
        .iter()
        .find(|e| e.level == Level::ERROR)
        .expect("error event");
    assert_eq!(failure.message(), "unable to join channel");
    assert_eq!(failure.fields["reason"], "unmatched topic");
    assert_eq!(failure.fields["topic"], "life");
}

#[test]
fn rejected_payload_is_a_warning() {
    let mut h = host();
    h.connect_and_join(r#"{"positions":[]}"#).unwrap();
    let (result, captured) = capture(|| h.server_push(r#"{"cells":[]}"#));
    assert!(result.is_err());

    let warnings: Vec<_> = captured
        .events
        .iter()
        .filter(|e| e.level == Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message(), "rejected snapshot, keeping last frame");
    assert!(warnings[0].fields.contains_key("error"));
}

#[test]
fn every_render_pass_opens_a_frame_span() {
    let mut h = host();
    let (_, captured) = capture(|| {
        h.connect_and_join(r#"{"positions":[{"x":0,"y":0}]}"#).unwrap();
        h.server_push(r#"{"positions":[{"x":1,"y":0},{"x":2,"y":0}]}"#)
            .unwrap();
    });
    let frames: Vec<_> = captured
        .spans
        .iter()
        .filter(|s| s.name == "lifeview.render.frame")
        .collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].fields["frame_idx"], "1");
    assert_eq!(frames[1].fields["cells"], "2");
}

#[test]
fn toggles_are_logged_at_info() {
    let mut h = host();
    h.connect_and_join(r#"{"positions":[]}"#).unwrap();
    let (_, captured) = capture(|| {
        h.keypress();
        h.run_until(Duration::from_millis(150));
        h.keypress();
    });
    let toggles = captured
        .events
        .iter()
        .filter(|e| e.level == Level::INFO && e.message() == "play state toggled")
        .count();
    assert_eq!(toggles, 2);
}
