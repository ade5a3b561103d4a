//! Configuration management for DeployBot
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer defaults, a `deploybot.toml` file, the
//! environment and command-line arguments.

use crate::cli::Cli;
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// The configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "deploybot.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level (or `EnvFilter` directive) for the application.
    pub log_level: String,
    /// Log record format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Chat backend settings.
    pub chat: ChatConfig,
    /// Settings for the push endpoint.
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Which messaging backend to notify.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatApp {
    #[default]
    Slack,
    #[serde(alias = "googlechat", alias = "gchat")]
    Google,
}

/// Configuration for the chat backend.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ChatConfig {
    /// The backend to use.
    #[serde(default)]
    pub app: ChatApp,
    /// The bot credential.
    #[serde(default)]
    pub token: String,
    /// The channel (Slack) or space (Google Chat) to post to.
    #[serde(default)]
    pub channel: String,
    /// Overrides the backend endpoint, e.g. to point at a test server.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Configuration for the Pub/Sub push endpoint.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ServerConfig {
    /// Serve push deliveries on this address instead of relaying one event.
    pub listen_addr: Option<SocketAddr>,
}

impl Config {
    /// Loads the application configuration.
    ///
    /// Sources are merged in order: defaults, the TOML file, the legacy
    /// `TOKEN`/`CHANNEL`/`CHATAPP` variables, `DEPLOYBOT_` variables
    /// (`__` separates nested keys) and finally the command line.
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = cli
            .config
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::raw().filter_map(|key| {
                match key.as_str().to_ascii_uppercase().as_str() {
                    "TOKEN" => Some("chat.token".into()),
                    "CHANNEL" => Some("chat.channel".into()),
                    "CHATAPP" => Some("chat.app".into()),
                    _ => None,
                }
            }))
            .merge(Env::prefixed("DEPLOYBOT_").split("__"))
            .merge(cli)
            .extract()?;
        Ok(config)
    }

    /// Checks that everything needed to send notifications is present.
    pub fn validate(&self) -> Result<()> {
        if self.chat.token.is_empty() || self.chat.channel.is_empty() {
            bail!("please define the TOKEN and CHANNEL env vars (or chat.token and chat.channel)");
        }
        Ok(())
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            chat: ChatConfig::default(),
            server: ServerConfig::default(),
        }
    }
}
