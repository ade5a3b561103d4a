//! Command-Line Interface (CLI) argument parsing.
//!
//! The arguments are parsed at startup and merged over the configuration
//! file and environment variables.

use crate::config::ChatApp;
use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Relays Cloud Deploy release and rollout events to Slack or Google Chat.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Chat backend to post to.
    #[arg(long, value_enum)]
    pub chat_app: Option<ChatAppArg>,

    /// Channel (Slack) or space (Google Chat) to post to.
    #[arg(long)]
    pub channel: Option<String>,

    /// Override the chat backend endpoint.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Serve Pub/Sub push deliveries on this address.
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Relay a single operations message read from FILE ("-" for stdin).
    #[arg(long, value_name = "FILE", conflicts_with = "listen")]
    pub event: Option<PathBuf>,

    /// Logging level or filter directive.
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAppArg {
    Slack,
    Google,
}

impl From<ChatAppArg> for ChatApp {
    fn from(arg: ChatAppArg) -> Self {
        match arg {
            ChatAppArg::Slack => ChatApp::Slack,
            ChatAppArg::Google => ChatApp::Google,
        }
    }
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut chat = Dict::new();
        if let Some(app) = self.chat_app {
            let name = match ChatApp::from(app) {
                ChatApp::Slack => "slack",
                ChatApp::Google => "google",
            };
            chat.insert("app".into(), Value::from(name));
        }
        if let Some(channel) = &self.channel {
            chat.insert("channel".into(), Value::from(channel.clone()));
        }
        if let Some(endpoint) = &self.endpoint {
            chat.insert("endpoint".into(), Value::from(endpoint.clone()));
        }

        let mut dict = Dict::new();
        if !chat.is_empty() {
            dict.insert("chat".into(), Value::from(chat));
        }
        if let Some(addr) = self.listen {
            let mut server = Dict::new();
            server.insert("listen_addr".into(), Value::from(addr.to_string()));
            dict.insert("server".into(), Value::from(server));
        }
        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
