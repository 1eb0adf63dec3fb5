use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::alias::{self, AliasTable};
use crate::dispatch::DEFAULT_CHAT_COMMAND;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub rcon: RconConfig,
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    /// `:token:` → glyph. Falls back to the built-in table when absent.
    #[serde(default)]
    pub aliases: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RconConfig {
    #[serde(default = "default_rcon_address")]
    pub address: String,
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct YouTubeConfig {
    pub video_id: String,
    /// Upper bound on the server-requested delay between chat polls
    #[serde(default = "default_max_poll_interval_ms")]
    pub max_poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    /// Console command that displays relayed chat
    #[serde(default = "default_chat_command")]
    pub command: String,
    /// Console command to run on super chats, super stickers and new members
    #[serde(default)]
    pub on_paid_event: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            command: default_chat_command(),
            on_paid_event: None,
        }
    }
}

fn default_rcon_address() -> String {
    "127.0.0.1:25575".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_poll_interval_ms() -> u64 {
    2000
}

fn default_chat_command() -> String {
    DEFAULT_CHAT_COMMAND.to_string()
}

impl RconConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl YouTubeConfig {
    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.youtube.video_id.trim().is_empty() {
            anyhow::bail!("[youtube] video_id must not be empty");
        }
        if self.rcon.password.is_empty() {
            anyhow::bail!("[rcon] password must not be empty");
        }
        if self.relay.command.trim().is_empty() {
            anyhow::bail!("[relay] command must not be empty");
        }
        if let Some(aliases) = &self.aliases {
            for token in aliases.keys() {
                if !alias::is_alias_token(token) {
                    anyhow::bail!(
                        "[aliases] key {:?} is not of the form :identifier:",
                        token
                    );
                }
            }
        }
        Ok(())
    }

    /// The alias table to sanitize with
    pub fn alias_table(&self) -> AliasTable {
        match &self.aliases {
            Some(aliases) => AliasTable::new(aliases.clone()),
            None => AliasTable::builtin(),
        }
    }
}
