//! Entry point called once per incoming deployment event.

use crate::core::{ChatAdapter, EventAttributes, ACTION, RESOURCE_TYPE};
use tracing::{error, info, warn};

/// What happened to one relayed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The backend accepted the message; carries its confirmation text.
    Delivered(String),
    /// The event was not a Release or Rollout event and was skipped.
    Skipped(String),
    /// Delivery was attempted and failed.
    Failed(String),
}

/// Relays one event to the chat backend and logs the result.
///
/// Failures are logged and reported in the returned [`Outcome`] but never
/// propagated: the event source should treat every event as handled.
pub async fn relay_event(
    adapter: &dyn ChatAdapter,
    channel: &str,
    attributes: &EventAttributes,
) -> Outcome {
    info!(
        backend = adapter.name(),
        resource_type = attributes.get(RESOURCE_TYPE),
        action = attributes.get(ACTION),
        "Received deployment event"
    );

    match adapter.send_message(channel, attributes).await {
        Ok(confirmation) => {
            let confirmation = confirmation.replace('"', "'");
            info!(response = %confirmation, "Posted notification to chat app");
            Outcome::Delivered(confirmation)
        }
        Err(e) if e.is_validation() => {
            warn!(error = %e, "Skipping event");
            Outcome::Skipped(e.to_string())
        }
        Err(e) => {
            error!(error = %e, "Error posting to chat app");
            Outcome::Failed(e.to_string())
        }
    }
}
