//! Slack "Block Kit" messages and the adapter that posts them.

use super::message::{header_text, ConsoleLinks};
use super::transport::HttpTransport;
use super::NotifyError;
use crate::core::{
    ChatAdapter, EventAttributes, ResourceType, Status, ACTION, DELIVERY_PIPELINE_ID, RELEASE_ID,
    ROLLOUT_ID, TARGET_ID,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// The `chat.postMessage` request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackMessage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel: String,
    #[serde(default)]
    pub unfurl_links: bool,
    /// Fallback text used by notifications and clients that can't show blocks.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TextBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ButtonBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub emoji: bool,
}

impl TextBlock {
    fn plain(text: String) -> Self {
        Self {
            kind: "plain_text".to_string(),
            text,
            emoji: true,
        }
    }

    fn mrkdwn(text: String) -> Self {
        Self {
            kind: "mrkdwn".to_string(),
            text,
            emoji: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: TextBlock,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Block {
    fn header(text: String) -> Self {
        Self {
            kind: "header".to_string(),
            text: Some(TextBlock::plain(text)),
            fields: Vec::new(),
            elements: Vec::new(),
        }
    }

    fn section(markdown: String) -> Self {
        Self {
            kind: "section".to_string(),
            text: Some(TextBlock::mrkdwn(markdown)),
            fields: Vec::new(),
            elements: Vec::new(),
        }
    }

    fn link_button(label: &str, url: &str) -> Self {
        Self {
            kind: "actions".to_string(),
            text: None,
            fields: Vec::new(),
            elements: vec![ButtonBlock {
                kind: "button".to_string(),
                text: TextBlock::plain(format!("View {}", label)),
                style: Some("primary".to_string()),
                url: Some(url.to_string()),
                value: None,
            }],
        }
    }
}

/// Builds the Block Kit blocks for an event.
///
/// The shape is always a header, two sections and one button linking to
/// the console; only the section contents depend on the resource type.
pub fn build_blocks(resource: ResourceType, attributes: &EventAttributes) -> Vec<Block> {
    let links = ConsoleLinks::from_attributes(attributes);
    let status = Status::from_attributes(attributes);
    let (action_url, action_label) = links.action(resource);

    let (summary, details) = match resource {
        ResourceType::Release => (
            format!(
                "*Release: <{}|{}>*",
                links.release,
                attributes.get(RELEASE_ID)
            ),
            format!(
                "*Status:* {} {} \n*Where:* <{}|{}>",
                attributes.get(ACTION),
                status.marker(),
                links.pipeline,
                attributes.get(DELIVERY_PIPELINE_ID)
            ),
        ),
        ResourceType::Rollout => (
            format!(
                "*Rollout: <{}|{}>* \n*Target:* <{}|{}>",
                links.release,
                attributes.get(ROLLOUT_ID),
                links.target,
                attributes.get(TARGET_ID)
            ),
            format!(
                "*Status:* {} {} \n*Release:* <{}|{}> \n*Pipeline:* <{}|{}>",
                attributes.get(ACTION),
                status.marker(),
                links.release,
                attributes.get(RELEASE_ID),
                links.pipeline,
                attributes.get(DELIVERY_PIPELINE_ID)
            ),
        ),
    };

    // The trailing actions block carries the one console link every message ends with.
    vec![
        Block::header(header_text(resource, attributes)),
        Block::section(summary),
        Block::section(details),
        Block::link_button(action_label, action_url),
    ]
}

/// Posts notifications through the Slack Web API.
pub struct SlackAdapter {
    bot_token: String,
    url: String,
    transport: HttpTransport,
}

impl SlackAdapter {
    /// Creates an adapter that posts to Slack's `chat.postMessage`.
    pub fn new(bot_token: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            bot_token: bot_token.into(),
            url: SLACK_POST_MESSAGE_URL.to_string(),
            transport: HttpTransport::new()?,
        })
    }

    /// Redirects delivery to `url`, which is used verbatim.
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Builds the full request body for an event.
    pub fn build_message(
        &self,
        channel: &str,
        resource: ResourceType,
        attributes: &EventAttributes,
    ) -> SlackMessage {
        SlackMessage {
            token: self.bot_token.clone(),
            channel: channel.to_string(),
            unfurl_links: false,
            text: header_text(resource, attributes),
            blocks: build_blocks(resource, attributes),
        }
    }
}

#[async_trait]
impl ChatAdapter for SlackAdapter {
    fn name(&self) -> &str {
        "slack"
    }

    #[instrument(skip(self, attributes))]
    async fn send_message(
        &self,
        channel: &str,
        attributes: &EventAttributes,
    ) -> Result<String, NotifyError> {
        let resource = ResourceType::from_attributes(attributes)?;
        let message = self.build_message(channel, resource, attributes);

        debug!(url = %self.url, "Posting message to Slack");
        self.transport
            .post_json(&self.url, Some(&self.bot_token), &message)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(resource: &str, action: &str) -> EventAttributes {
        [
            ("ResourceType", resource),
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

    fn header_of(blocks: &[Block]) -> &str {
        &blocks[0].text.as_ref().unwrap().text
    }

    #[test]
    fn test_header_names_resource_and_status() {
        let cases = [
            ("Release", "Start", "started"),
            ("Release", "Succeed", "completed"),
            ("Rollout", "Start", "started"),
            ("Rollout", "Succeed", "completed"),
        ];
        for (resource, action, word) in cases {
            let attributes = attrs(resource, action);
            let resource_type = ResourceType::from_attributes(&attributes).unwrap();
            let blocks = build_blocks(resource_type, &attributes);
            let header = header_of(&blocks);
            assert!(header.contains(resource), "{} missing from {}", resource, header);
            assert!(header.contains(word), "{} missing from {}", word, header);
        }
    }

    #[test]
    fn test_block_shape_is_constant() {
        for resource in [ResourceType::Release, ResourceType::Rollout] {
            let blocks = build_blocks(resource, &attrs(resource.as_str(), "Start"));
            let kinds: Vec<&str> = blocks.iter().map(|b| b.kind.as_str()).collect();
            assert_eq!(kinds, vec!["header", "section", "section", "actions"]);
            assert_eq!(blocks[3].elements.len(), 1);
            assert_eq!(blocks[0].text.as_ref().unwrap().kind, "plain_text");
            assert!(blocks[0].text.as_ref().unwrap().emoji);
        }
    }

    #[test]
    fn test_release_blocks() {
        let attributes = attrs("Release", "Succeed");
        let blocks = build_blocks(ResourceType::Release, &attributes);
        let links = ConsoleLinks::from_attributes(&attributes);

        assert_eq!(
            blocks[1].text.as_ref().unwrap().text,
            format!("*Release: <{}|rel-20>*", links.release)
        );
        assert_eq!(
            blocks[2].text.as_ref().unwrap().text,
            format!("*Status:* Succeed ✅ \n*Where:* <{}|pipe-1>", links.pipeline)
        );

        let button = &blocks[3].elements[0];
        assert_eq!(button.text.text, "View Release");
        assert_eq!(button.url.as_deref(), Some(links.release.as_str()));
    }

    #[test]
    fn test_rollout_blocks() {
        let attributes = attrs("Rollout", "Start");
        let blocks = build_blocks(ResourceType::Rollout, &attributes);
        let links = ConsoleLinks::from_attributes(&attributes);

        let summary = &blocks[1].text.as_ref().unwrap().text;
        assert!(summary.contains("rel-20-to-prod-0001"));
        assert!(summary.contains(&format!("<{}|prod>", links.target)));

        let details = &blocks[2].text.as_ref().unwrap().text;
        assert!(details.starts_with("*Status:* Start ⏳"));
        assert!(details.contains(&format!("*Release:* <{}|rel-20>", links.release)));
        assert!(details.contains(&format!("*Pipeline:* <{}|pipe-1>", links.pipeline)));

        let button = &blocks[3].elements[0];
        assert_eq!(button.text.text, "View Target");
        assert_eq!(button.url.as_deref(), Some(links.target.as_str()));
    }

    #[test]
    fn test_unknown_action_uses_warning_marker() {
        let attributes = attrs("Release", "Failure");
        let blocks = build_blocks(ResourceType::Release, &attributes);
        assert!(header_of(&blocks).contains("Release"));
        assert!(blocks[2].text.as_ref().unwrap().text.contains("⚠️"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let attributes = attrs("Rollout", "Succeed");
        assert_eq!(
            build_blocks(ResourceType::Rollout, &attributes),
            build_blocks(ResourceType::Rollout, &attributes)
        );
    }

    #[test]
    fn test_envelope_round_trip() {
        let adapter = SlackAdapter::new("xoxb-test").unwrap();
        let attributes = attrs("Rollout", "Succeed");
        let message = adapter.build_message("deploys", ResourceType::Rollout, &attributes);

        let wire = serde_json::to_value(&message).unwrap();
        assert_eq!(wire["channel"], "deploys");
        assert_eq!(wire["unfurl_links"], false);
        assert_eq!(wire["blocks"][0]["type"], "header");

        let decoded: SlackMessage = serde_json::from_value(wire).unwrap();
        assert_eq!(decoded, message);
        assert_eq!(header_of(&decoded.blocks), "Rollout completed");
        assert_eq!(
            decoded.blocks[3].elements[0].url.as_deref(),
            Some(ConsoleLinks::from_attributes(&attributes).target.as_str())
        );
    }
}
