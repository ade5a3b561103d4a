//! Construction of the chat backend from configuration.

use crate::{
    config::{ChatApp, ChatConfig},
    core::ChatAdapter,
    notification::{GoogleChatAdapter, NotifyError, SlackAdapter},
};
use std::sync::Arc;
use tracing::info;

/// Builds the adapter for the configured backend.
///
/// This is done once at startup; the returned adapter is shared by every
/// event the process relays.
pub fn build_chat_adapter(config: &ChatConfig) -> Result<Arc<dyn ChatAdapter>, NotifyError> {
    let adapter: Arc<dyn ChatAdapter> = match config.app {
        ChatApp::Slack => {
            let mut adapter = SlackAdapter::new(config.token.clone())?;
            if let Some(endpoint) = &config.endpoint {
                adapter = adapter.with_endpoint(endpoint.clone());
            }
            Arc::new(adapter)
        }
        ChatApp::Google => {
            let mut adapter = GoogleChatAdapter::new(config.token.clone())?;
            if let Some(endpoint) = &config.endpoint {
                adapter = adapter.with_endpoint(endpoint.clone());
            }
            Arc::new(adapter)
        }
    };

    info!(
        backend = adapter.name(),
        endpoint_override = config.endpoint.is_some(),
        "Chat adapter ready"
    );
    Ok(adapter)
}
