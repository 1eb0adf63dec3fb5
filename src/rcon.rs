//! Minecraft RCON console access.
//!
//! The wire protocol lives in the `rcon` crate; this module owns the
//! connection lifecycle and exposes it behind [`ConsoleTransport`].

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type Connection = ::rcon::Connection<TcpStream>;

/// Anything that can run a single console command and return its output.
#[async_trait]
pub trait ConsoleTransport: Send + Sync {
    async fn execute(&self, command: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Error)]
pub enum RconError {
    #[error("RCON error: {0}")]
    Rcon(#[from] ::rcon::Error),
    #[error("RCON request timed out after {0:?}")]
    Timeout(Duration),
}

/// RCON connection to a game server.
///
/// Connects and authenticates lazily on the first command. The connection is
/// held behind a mutex so only one request is on the wire at a time; any
/// failure drops it and the next command reconnects.
pub struct RconClient {
    address: String,
    password: String,
    timeout: Duration,
    conn: Mutex<Option<Connection>>,
}

impl RconClient {
    pub fn new(address: impl Into<String>, password: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            password: password.into(),
            timeout,
            conn: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<Connection, RconError> {
        info!("Connecting to RCON at {}", self.address);
        let conn = Connection::builder()
            .enable_minecraft_quirks(true)
            .connect(self.address.as_str(), &self.password)
            .await?;
        info!("RCON authenticated with {}", self.address);
        Ok(conn)
    }

    async fn exchange(&self, slot: &mut Option<Connection>, command: &str) -> Result<String, RconError> {
        // Taken out for the duration of the request so a failure or timeout drops it
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => self.connect().await?,
        };
        let response = conn.cmd(command).await?;
        *slot = Some(conn);
        Ok(response)
    }

    pub async fn send(&self, command: &str) -> Result<String, RconError> {
        let mut slot = self.conn.lock().await;
        let result = match tokio::time::timeout(self.timeout, self.exchange(&mut slot, command)).await
        {
            Ok(result) => result,
            Err(_) => Err(RconError::Timeout(self.timeout)),
        };

        if let Err(e) = &result {
            warn!("RCON request failed, dropping connection: {}", e);
        }
        result
    }
}

#[async_trait]
impl ConsoleTransport for RconClient {
    async fn execute(&self, command: &str) -> anyhow::Result<String> {
        debug!("RCON > {}", command);
        let response = self.send(command).await?;
        debug!("RCON < {}", response);
        Ok(response)
    }
}
