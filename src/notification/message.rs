//! Message derivation shared by every backend.

use crate::core::{
    EventAttributes, ResourceType, Status, DELIVERY_PIPELINE_ID, LOCATION, PROJECT_NUMBER,
    RELEASE_ID, TARGET_ID,
};

const CONSOLE_BASE: &str = "https://console.cloud.google.com/deploy/delivery-pipelines";

/// Builds the header text, e.g. "Release started" or "Rollout completed".
pub fn header_text(resource: ResourceType, attributes: &EventAttributes) -> String {
    format!("{} {}", resource, Status::from_attributes(attributes).word())
}

/// Cloud console links for the pipeline an event belongs to.
///
/// Values are substituted as-is; missing attributes produce odd-looking
/// links rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLinks {
    pub pipeline: String,
    pub release: String,
    pub target: String,
}

impl ConsoleLinks {
    pub fn from_attributes(attributes: &EventAttributes) -> Self {
        let base = format!(
            "{}/{}/{}/",
            CONSOLE_BASE,
            attributes.get(LOCATION),
            attributes.get(DELIVERY_PIPELINE_ID)
        );
        let project = attributes.get(PROJECT_NUMBER);

        Self {
            pipeline: format!("{}?project={}", base, project),
            release: format!(
                "{}releases/{}/rollouts?project={}",
                base,
                attributes.get(RELEASE_ID),
                project
            ),
            target: format!(
                "{}targets/{}?project={}",
                base,
                attributes.get(TARGET_ID),
                project
            ),
        }
    }

    /// The call-to-action link and its label for a resource type.
    pub fn action(&self, resource: ResourceType) -> (&str, &'static str) {
        match resource {
            ResourceType::Release => (&self.release, "Release"),
            ResourceType::Rollout => (&self.target, "Target"),
        }
    }
}
