//! Anime notification relay
//!
//! Subscribes to a NATS subject carrying anime bot notifications and turns
//! each one into Telegram Bot API calls.

mod bus;
mod config;
mod dispatcher;
mod env;
mod errors;
mod gateway;
mod health;
#[cfg(test)]
mod mocks;
mod payloads;
mod sink;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::env::SystemEnv;
use crate::gateway::HttpGateway;
use crate::health::{AppState, CountingSink};
use crate::sink::{ErrorSink, LogSink, NatsErrorSink};

/// Anime relay CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/anime-relay.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anime_relay=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting anime relay");

    let args = Args::parse();
    let config = Config::load(&args.config, &SystemEnv).context("failed to load configuration")?;

    info!(
        servers = ?config.nats.servers,
        subject = %config.nats.subject,
        error_subject = ?config.nats.error_subject,
        port = config.server.port,
        deep_link = config.inline.deep_link.as_str(),
        "Configuration loaded"
    );

    let client = bus::connect(&config.nats).await?;
    let gateway = HttpGateway::new(&config.bot).context("failed to build HTTP client")?;
    let state = AppState::new();

    let health_state = state.clone();
    let port = config.server.port;
    tokio::spawn(async move {
        if let Err(e) = health::start_health_server(health_state, port).await {
            error!(error = %e, "Health check server error");
        }
    });

    match config.nats.error_subject.clone() {
        Some(subject) => {
            let sink = NatsErrorSink::new(client.clone(), subject);
            serve(&config, &client, gateway, sink, state).await
        }
        None => serve(&config, &client, gateway, LogSink, state).await,
    }
}

async fn serve<S: ErrorSink>(
    config: &Config,
    client: &async_nats::Client,
    gateway: HttpGateway,
    sink: S,
    state: AppState,
) -> Result<()> {
    let sink = CountingSink::new(sink, state.clone());
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(gateway), sink, config));

    bus::run(client, &config.nats.subject, dispatcher, state).await?;

    info!("Anime relay stopped");
    Ok(())
}
