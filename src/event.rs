//! Inbound event envelopes.
//!
//! Cloud Deploy publishes operation notifications to Pub/Sub. The message
//! attributes carry everything we render; the data payload is ignored.

use crate::core::EventAttributes;
use serde::{Deserialize, Serialize};

/// A Cloud Deploy operations message, as delivered by Pub/Sub.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpsMessage {
    #[serde(default)]
    pub attributes: EventAttributes,
    /// Base64-encoded payload, unused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
}

/// The body of a Pub/Sub push delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    pub message: OpsMessage,
    #[serde(default)]
    pub subscription: String,
}
