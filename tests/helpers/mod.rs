#![allow(dead_code)]

pub mod mock_chat;

use deploybot::EventAttributes;

/// A fully populated event for the given resource type and action.
pub fn event(resource_type: &str, action: &str) -> EventAttributes {
    [
        ("ResourceType", resource_type),
        ("Action", action),
        ("ReleaseId", "rel-20"),
        ("RolloutId", "rel-20-to-prod-0001"),
        ("TargetId", "prod"),
        ("DeliveryPipelineId", "pipe-1"),
        ("Location", "us-central1"),
        ("ProjectNumber", "1234"),
    ]
    .into_iter()
    .collect()
}
