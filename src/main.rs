mod alias;
mod config;
mod dispatch;
mod envelope;
mod rcon;
mod relay;
mod sanitize;
mod youtube;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::dispatch::CommandDispatcher;
use crate::rcon::{ConsoleTransport, RconClient};
use crate::relay::Relay;
use crate::sanitize::Sanitizer;
use crate::youtube::YouTubeChat;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,l2ms=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let aliases = Arc::new(config.alias_table());
    info!("Configuration loaded successfully");
    info!("  Video: {}", config.youtube.video_id);
    info!("  RCON: {}", config.rcon.address);
    info!("  Chat command: {}", config.relay.command);
    info!("  Aliases: {}", aliases.len());
    if aliases.is_empty() {
        warn!("Alias table is empty; every :alias: token will be dropped");
    }

    let transport: Arc<dyn ConsoleTransport> = Arc::new(RconClient::new(
        config.rcon.address.clone(),
        config.rcon.password.clone(),
        config.rcon.timeout(),
    ));
    let dispatcher = Arc::new(CommandDispatcher::with_chat_command(
        transport,
        config.relay.command.clone(),
    ));

    if let Some(command) = config.relay.on_paid_event.clone() {
        info!("  Paid event command: {}", command);
        dispatcher.register_callback(move || Some(command.clone()));
    }

    let chat = YouTubeChat::connect(&config.youtube.video_id, config.youtube.max_poll_interval())
        .await
        .context("Failed to connect to live chat")?;
    info!("Relaying live chat of {}", chat.video_id());

    let relay = Relay::new(Sanitizer::new(aliases), dispatcher);
    relay.run(chat.stream()).await?;

    Ok(())
}
