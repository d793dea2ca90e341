// In app/src/tracing_layer.rs

use chrono::Utc;
use events::{ViewLogMessage, ViewMessage};
use tokio::sync::broadcast;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;

/// Forwards log events onto the UI broadcast channel so renderers can show
/// them alongside signal updates.
pub struct UiBroadcastLayer {
    tx: broadcast::Sender<ViewMessage>,
}

impl UiBroadcastLayer {
    pub fn new(tx: broadcast::Sender<ViewMessage>) -> Self {
        Self { tx }
    }
}

impl<S> Layer<S> for UiBroadcastLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        // Extract the message from the event's fields.
        let mut visitor = LogMessageVisitor::new();
        event.record(&mut visitor);
        let log_message = ViewLogMessage {
            timestamp: Utc::now(),
            level: event.metadata().level().to_string(),
            message: visitor.message,
        };
        // A send error just means no renderer is attached right now.
        let _ = self.tx.send(ViewMessage::Log(log_message));
    }
}

// A simple visitor to capture the `message` field of a log event.
struct LogMessageVisitor {
    message: String,
}

impl LogMessageVisitor {
    fn new() -> Self {
        Self {
            message: String::new(),
        }
    }
}

impl tracing::field::Visit for LogMessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}
