use std::sync::Arc;

use anyhow::Result;
use futures::{Stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::dispatch::CommandDispatcher;
use crate::envelope::Envelope;
use crate::sanitize::Sanitizer;
use crate::youtube::{ChatEvent, EventKind};

/// Callback result: an optional console command to run for the event
pub type PaidEventDispatcher = CommandDispatcher<Option<String>>;

/// Moves chat events from the listener to the game console.
pub struct Relay {
    sanitizer: Sanitizer,
    dispatcher: Arc<PaidEventDispatcher>,
}

impl Relay {
    pub fn new(sanitizer: Sanitizer, dispatcher: Arc<PaidEventDispatcher>) -> Self {
        Self {
            sanitizer,
            dispatcher,
        }
    }

    /// Consume the event stream until it ends. Per-event failures are logged and skipped.
    pub async fn run<S>(&self, events: S) -> Result<()>
    where
        S: Stream<Item = Result<ChatEvent>>,
    {
        futures::pin_mut!(events);

        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    if let Err(e) = self.handle_event(&event).await {
                        error!("Failed to relay {} {}: {:#}", event.kind, event.id, e);
                    }
                }
                Err(e) => error!("Live chat error: {:#}", e),
            }
        }

        info!("Chat stream ended");
        Ok(())
    }

    /// Relay one event. Returns the console's reply, or `None` when nothing was sent.
    pub async fn handle_event(&self, event: &ChatEvent) -> Result<Option<String>> {
        info!("{}", format_log_line(event));
        if let Ok(json) = serde_json::to_string(event) {
            debug!("Event payload: {}", json);
        }

        if event.kind == EventKind::ViewerEngagementMessage {
            return Ok(None);
        }
        if !is_trusted_display_name(&event.author.name) {
            warn!("Not relaying message {}: unsafe sender name", event.id);
            return Ok(None);
        }

        if event.kind.is_paid() {
            let command = self.dispatcher.invoke_callback().flatten();
            match self.dispatcher.send_raw_command(command.as_deref()).await {
                Ok(Some(reply)) => debug!("Paid event command replied: {}", reply),
                Ok(None) => {}
                Err(e) => error!("Paid event command for {} failed: {:#}", event.id, e),
            }
        }

        let sanitized = self.sanitizer.sanitize(&event.text);
        let envelope = Envelope::build(&event.author.name, sanitized);
        match &envelope {
            Some(envelope) => debug!("Forwarding {} from {}", event.id, envelope.sender_name()),
            None => debug!("Message {} sanitized to nothing", event.id),
        }
        self.dispatcher.forward(envelope.as_ref()).await
    }
}

/// Sender names go into the envelope unescaped, so anything that could close
/// the quoted field or break the command line is refused.
pub fn is_trusted_display_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c == '"' || c == '\\' || c.is_control())
}

/// `[2024-01-01 12:00:00] [superChat] name👑: text (¥1,000)`
pub fn format_log_line(event: &ChatEvent) -> String {
    let mut line = format!(
        "[{}] [{}] {}{}: {}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S"),
        event.kind,
        event.author.name,
        event.author.badges(),
        event.text
    );
    if let Some(amount) = &event.amount {
        line.push_str(&format!(" ({})", amount));
    }
    line
}
