use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::debug;

use crate::envelope::Envelope;
use crate::rcon::ConsoleTransport;

/// Console command used to show relayed chat
pub const DEFAULT_CHAT_COMMAND: &str = "say";

type Callback<R> = Arc<dyn Fn() -> R + Send + Sync>;

/// Forwards envelopes and raw commands to the game console.
///
/// Also holds a single callback slot the chat listener can use to hook custom
/// behaviour onto particular events. Registering a new callback replaces the
/// previous one.
pub struct CommandDispatcher<R = ()> {
    transport: Arc<dyn ConsoleTransport>,
    chat_command: String,
    callback: Mutex<Option<Callback<R>>>,
}

impl<R> CommandDispatcher<R> {
    pub fn new(transport: Arc<dyn ConsoleTransport>) -> Self {
        Self::with_chat_command(transport, DEFAULT_CHAT_COMMAND)
    }

    pub fn with_chat_command(
        transport: Arc<dyn ConsoleTransport>,
        chat_command: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            chat_command: chat_command.into(),
            callback: Mutex::new(None),
        }
    }

    /// Send an envelope as `<chat command> <wire form>`.
    ///
    /// `None` is a no-op and never touches the transport.
    pub async fn forward(&self, envelope: Option<&Envelope>) -> Result<Option<String>> {
        let Some(envelope) = envelope else {
            return Ok(None);
        };
        let command = format!("{} {}", self.chat_command, envelope);
        self.transport.execute(&command).await.map(Some)
    }

    /// Send a command verbatim; `None` is a no-op.
    pub async fn send_raw_command(&self, command: Option<&str>) -> Result<Option<String>> {
        match command {
            Some(command) => {
                debug!("Sending raw command: {}", command);
                self.transport.execute(command).await.map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn register_callback<F>(&self, handler: F)
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        let handler: Callback<R> = Arc::new(handler);
        let mut slot = self.callback.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(handler);
    }

    /// Run the registered callback. Returns `None` when nothing is registered.
    pub fn invoke_callback(&self) -> Option<R> {
        // Clone out of the lock so the handler may re-register itself
        let handler = self
            .callback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        handler.map(|h| h())
    }
}
