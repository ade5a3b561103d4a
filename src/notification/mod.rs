//! Turns deployment events into chat notifications.
//!
//! Each backend lives in its own module with its own wire model and
//! message builder, and implements the shared [`ChatAdapter`] contract.
//! Validation, header derivation and console links are shared here so
//! that every backend renders the same event the same way.
//!
//! [`ChatAdapter`]: crate::core::ChatAdapter

pub mod dispatch;
pub mod google_auth;
pub mod google_chat;
pub mod message;
pub mod slack;
pub mod transport;

use reqwest::StatusCode;
use thiserror::Error;

pub use google_chat::GoogleChatAdapter;
pub use slack::SlackAdapter;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("could not find ResourceType key")]
    MissingResourceType,

    #[error("resource type {0:?} is not a Release or a Rollout")]
    UnsupportedResourceType(String),

    #[error("failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    #[error("could not authenticate with the chat backend: {0}")]
    Auth(String),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("request was not ok: {0}")]
    Status(StatusCode),
}

impl NotifyError {
    /// True if the event itself was rejected before any I/O happened.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingResourceType | Self::UnsupportedResourceType(_)
        )
    }
}
