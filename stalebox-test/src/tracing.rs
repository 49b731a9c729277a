//! Tracing capture for asserting on fetcher spans and log events.

use std::sync::{Arc, Mutex};

use tracing::span::{Attributes, Id};
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

/// Captured span information.
#[derive(Debug, Clone)]
pub struct CapturedSpan {
    /// The span name (e.g., "stalebox.fetch")
    pub name: String,
    /// Captured field values as strings
    pub fields: Vec<(String, String)>,
}

impl CapturedSpan {
    /// Returns the value of a field, if recorded.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Captured log event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    /// The formatted `message` field
    pub message: String,
    /// Other fields as strings
    pub fields: Vec<(String, String)>,
    /// Name of the innermost span the event was emitted in
    pub span: Option<String>,
}

impl CapturedEvent {
    /// Returns the value of a field, if recorded.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

struct CaptureLayer {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor {
    fields: Vec<(String, String)>,
}

impl FieldVisitor {
    fn new() -> Self {
        Self { fields: Vec::new() }
    }

    fn take_message(&mut self) -> String {
        match self.fields.iter().position(|(key, _)| key == "message") {
            Some(index) => self.fields.remove(index).1,
            None => String::new(),
        }
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.fields
            .push((field.name().to_string(), format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields
            .push((field.name().to_string(), value.to_string()));
    }
}

fn is_stalebox(target: &str) -> bool {
    target.starts_with("stalebox")
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        let metadata = attrs.metadata();
        if !metadata.name().starts_with("stalebox.") {
            return;
        }

        let mut visitor = FieldVisitor::new();
        attrs.record(&mut visitor);
        self.spans.lock().unwrap().push(CapturedSpan {
            name: metadata.name().to_string(),
            fields: visitor.fields,
        });
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !is_stalebox(metadata.target()) {
            return;
        }

        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);
        let message = visitor.take_message();
        let span = ctx.event_span(event).map(|span| span.name().to_string());
        self.events.lock().unwrap().push(CapturedEvent {
            level: *metadata.level(),
            message,
            fields: visitor.fields,
            span,
        });
    }
}

/// Collector for captured spans and events.
#[derive(Clone)]
pub struct TraceCollector {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    dispatch: Dispatch,
}

/// Create a new collector with its associated dispatch.
///
/// Use the dispatch with [`tracing::dispatcher::with_default`] or
/// [`tracing::instrument::WithSubscriber`] around the code under test.
pub fn create_trace_collector() -> TraceCollector {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = CaptureLayer {
        spans: spans.clone(),
        events: events.clone(),
    };
    let subscriber = Registry::default().with(layer);
    TraceCollector {
        spans,
        events,
        dispatch: Dispatch::new(subscriber),
    }
}

impl TraceCollector {
    /// Get the dispatch for use with spawned tasks.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Get all captured spans.
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    /// Get all captured events.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Get messages of captured events in order.
    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.message.clone())
            .collect()
    }

    /// Get captured events at a given level.
    pub fn events_at(&self, level: Level) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.level == level)
            .cloned()
            .collect()
    }
}
