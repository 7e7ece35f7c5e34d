#![forbid(unsafe_code)]

//! Log events are structured and carry the per-subsystem targets.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use flipbook_core::{Direction, Flipbook};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: Vec<(String, String)>,
}

impl CapturedEvent {
    fn message(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == "message")
            .map(|(_, v)| v.as_str())
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0,
        });
    }
}

fn with_captured_events<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(EventCapture {
            events: events.clone(),
        });
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

#[test]
fn navigation_logs_under_nav_target() {
    let events = with_captured_events(|| {
        let mut book = Flipbook::with_defaults([None, None, Some("Labrador")]).unwrap();
        book.init();
        book.navigate(Direction::Next);
        book.navigate(Direction::Prev);
        book.navigate(Direction::Prev);
    });

    let flips: Vec<_> = events
        .iter()
        .filter(|e| e.message() == Some("page flipped"))
        .collect();
    assert_eq!(flips.len(), 2);
    assert!(flips.iter().all(|e| e.target == "flipbook.nav"));
    assert!(flips.iter().all(|e| e.level == tracing::Level::DEBUG));
    assert_eq!(flips[0].field("direction"), Some("next"));
    assert_eq!(flips[0].field("to"), Some("1"));

    let boundary = events
        .iter()
        .find(|e| e.message() == Some("navigation at boundary"))
        .expect("boundary trace");
    assert_eq!(boundary.level, tracing::Level::TRACE);
}

#[test]
fn every_subsystem_logs_with_its_own_target() {
    let events = with_captured_events(|| {
        let mut book = Flipbook::with_defaults([None, None, Some("Poodle")]).unwrap();
        book.init();
        book.apply_filter("pood");
        book.pointer_down(5.0, 5.0);
        book.frame_presented();
        book.advance(Duration::from_secs(3));
    });

    for target in [
        "flipbook.filter",
        "flipbook.effect",
        "flipbook.loader",
        "flipbook.sched",
    ] {
        assert!(
            events.iter().any(|e| e.target == target),
            "no event logged under {target}"
        );
    }
    let filter = events
        .iter()
        .find(|e| e.target == "flipbook.filter")
        .expect("filter event");
    assert_eq!(filter.field("term"), Some("pood"));
    assert_eq!(filter.field("visible"), Some("3"));
}

#[test]
fn no_events_above_debug_on_normal_operation() {
    let events = with_captured_events(|| {
        let mut book = Flipbook::with_defaults([None, None, Some("Beagle")]).unwrap();
        book.init();
        book.navigate(Direction::Next);
        book.advance(Duration::from_secs(3));
    });
    assert!(events.iter().all(|e| e.level >= tracing::Level::DEBUG));
}
