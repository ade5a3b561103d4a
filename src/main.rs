//! DeployBot - Cloud Deploy notifications for Slack and Google Chat
//!
//! Relays a single operations message (`--event`) or serves Pub/Sub push
//! deliveries (`--listen`) to the configured chat backend.

use anyhow::{Context, Result};
use clap::Parser;
use deploybot::{
    cli::Cli,
    config::{Config, LogFormat},
    event::OpsMessage,
    notification::dispatch::relay_event,
    server::PushServer,
    services::build_chat_adapter,
};
use std::io::Read;
use std::path::Path;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli)
        .and_then(|config| config.validate().map(|_| config))
        .unwrap_or_else(|err| {
            // Logging isn't configured yet; fall back to the defaults for this one error.
            let _ = tracing_subscriber::fmt().try_init();
            error!("Failed to load configuration: {:#}", err);
            std::process::exit(1);
        });

    init_logging(&config);

    info!("DeployBot starting up...");
    info!("Chat App: {:?}", config.chat.app);
    info!("Channel: {}", config.chat.channel);
    if let Some(endpoint) = &config.chat.endpoint {
        info!("Endpoint Override: {}", endpoint);
    }

    let adapter = build_chat_adapter(&config.chat)?;

    if let Some(addr) = config.server.listen_addr {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        let server = PushServer::new(listener, adapter, &config.chat.channel);
        server
            .run(async move {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received. Shutting down gracefully...");
            })
            .await?;
        return Ok(());
    }

    let source = cli.event.as_deref().unwrap_or_else(|| Path::new("-"));
    let message = read_ops_message(source)?;
    let outcome = relay_event(adapter.as_ref(), &config.chat.channel, &message.attributes).await;
    info!(?outcome, "Event relayed");
    Ok(())
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

/// Reads an operations message from a file, or stdin for `-`.
fn read_ops_message(source: &Path) -> Result<OpsMessage> {
    let raw = if source == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read event from stdin")?;
        raw
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("failed to read event file {}", source.display()))?
    };
    serde_json::from_str(&raw).context("event is not a valid operations message")
}
