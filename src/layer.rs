use chrono::Utc;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::handler::TextHandler;
use crate::record::{Level, LogRecord};
use crate::value::Attr;

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// forwards them to a [`TextHandler`].
///
/// The event's `message` field becomes the record message; every other
/// field becomes an attribute, in field order. Formatting and the single
/// sink write happen synchronously on the thread that emitted the event.
pub struct TextLayer {
    handler: TextHandler,
}

impl TextLayer {
    pub fn new(handler: TextHandler) -> Self {
        TextLayer { handler }
    }
}

fn level_of(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::INFO => Level::Info,
        // TRACE folds into the handler's least severe level.
        _ => Level::Debug,
    }
}

impl<S> Layer<S> for TextLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        let level = level_of(event.metadata().level());
        if !self.handler.enabled(level) {
            return;
        }

        let mut attrs = Vec::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor {
            attrs: &mut attrs,
            message: &mut message,
        };
        event.record(&mut visitor);

        let record = LogRecord {
            timestamp: Utc::now(),
            level,
            message: message.unwrap_or_default(),
            attrs,
        };

        // A rejected write is reported once and never re-logged.
        if let Err(e) = self.handler.handle(&record) {
            eprintln!("text log handler: dropping record: {}", e);
        }
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub attrs: &'a mut Vec<Attr>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.attrs.push(Attr::string(field.name(), value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.attrs.push(Attr::int(field.name(), value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.attrs.push(Attr::uint(field.name(), value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.attrs.push(Attr::float(field.name(), value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.attrs.push(Attr::bool(field.name(), value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.attrs.push(Attr::string(field.name(), format!("{:?}", value)));
        }
    }
}
