//! Core domain types and service traits for DeployBot
//!
//! This module defines the event attribute record handed to us by the
//! deployment event source, the policies derived from its load-bearing keys,
//! and the `ChatAdapter` contract every messaging backend implements.

use crate::notification::NotifyError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Attribute key naming the kind of resource the event is about.
pub const RESOURCE_TYPE: &str = "ResourceType";
/// Attribute key naming the lifecycle action (e.g. "Start", "Succeed").
pub const ACTION: &str = "Action";
pub const RELEASE_ID: &str = "ReleaseId";
pub const ROLLOUT_ID: &str = "RolloutId";
pub const DELIVERY_PIPELINE_ID: &str = "DeliveryPipelineId";
pub const TARGET_ID: &str = "TargetId";
pub const LOCATION: &str = "Location";
pub const PROJECT_NUMBER: &str = "ProjectNumber";

/// The flat key/value record describing one deployment lifecycle event.
///
/// The record is deliberately loose: unknown keys are carried but ignored,
/// and absent keys read as the empty string. Only `ResourceType` is
/// required, and that is enforced by [`ResourceType::from_attributes`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventAttributes(HashMap<String, String>);

impl EventAttributes {
    /// Returns the value for `key`, or `""` when the key is absent.
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Returns the value for `key` only if it is present.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for EventAttributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The resource types we know how to notify about.
///
/// This is a closed allow-list: any other value is rejected before a message
/// is built or anything is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Release,
    Rollout,
}

impl ResourceType {
    /// Validates the `ResourceType` attribute of an event.
    ///
    /// # Returns
    /// * `Ok(ResourceType)` for "Release" or "Rollout"
    /// * `Err(NotifyError::MissingResourceType)` if the key is absent
    /// * `Err(NotifyError::UnsupportedResourceType)` for any other value
    pub fn from_attributes(attributes: &EventAttributes) -> Result<Self, NotifyError> {
        match attributes.lookup(RESOURCE_TYPE) {
            None => Err(NotifyError::MissingResourceType),
            Some("Release") => Ok(Self::Release),
            Some("Rollout") => Ok(Self::Rollout),
            Some(other) => Err(NotifyError::UnsupportedResourceType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Release => "Release",
            Self::Rollout => "Rollout",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation status derived from the `Action` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Started,
    Succeeded,
    /// Any other action, carried verbatim.
    Other(String),
}

impl Status {
    pub fn from_attributes(attributes: &EventAttributes) -> Self {
        match attributes.get(ACTION) {
            "Start" => Self::Started,
            "Succeed" => Self::Succeeded,
            other => Self::Other(other.to_string()),
        }
    }

    /// The visual marker shown next to the status.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Succeeded => "✅",
            Self::Started => "⏳",
            Self::Other(_) => "⚠️",
        }
    }

    /// The word used in the message header, e.g. "started".
    pub fn word(&self) -> String {
        match self {
            Self::Started => "started".to_string(),
            Self::Succeeded => "completed".to_string(),
            Self::Other(action) if action.is_empty() => "updated".to_string(),
            Self::Other(action) => action.to_lowercase(),
        }
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Delivers deployment notifications to one messaging backend.
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// A short backend name (e.g. "slack"), used for logging.
    fn name(&self) -> &str;

    /// Validates the event, builds the backend message and posts it.
    ///
    /// # Arguments
    /// * `channel` - The destination channel or space identifier
    /// * `attributes` - The event attributes describing the deployment
    ///
    /// # Returns
    /// * `Ok(String)` with the backend's confirmation text
    /// * `Err` for validation, serialization or transport failures
    async fn send_message(
        &self,
        channel: &str,
        attributes: &EventAttributes,
    ) -> Result<String, NotifyError>;
}
