//! Google Chat card messages and the adapter that posts them.

use super::google_auth::ServiceAccountAuth;
use super::message::{header_text, ConsoleLinks};
use super::transport::HttpTransport;
use super::NotifyError;
use crate::core::{
    ChatAdapter, EventAttributes, ResourceType, ACTION, DELIVERY_PIPELINE_ID, RELEASE_ID,
    ROLLOUT_ID, TARGET_ID,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const GOOGLE_CHAT_API_URL: &str = "https://chat.googleapis.com";

/// A Google Chat message made of cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub header: CardHeader,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardHeader {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

/// A card widget: either one labelled value or a row of buttons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Widget {
    KeyValue(KeyValue),
    Buttons(Vec<Button>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValue {
    pub top_label: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    pub text_button: TextButton,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextButton {
    pub text: String,
    pub on_click: OnClick,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnClick {
    pub open_link: OpenLink,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenLink {
    pub url: String,
}

fn key_value(label: &str, content: &str) -> Widget {
    Widget::KeyValue(KeyValue {
        top_label: label.to_string(),
        content: content.to_string(),
    })
}

/// Builds a single-card message for an event.
///
/// The card has a key/value section (Release, Status, Pipeline, with Rollout
/// and Target first for rollouts) followed by a section holding one button.
pub fn build_message(resource: ResourceType, attributes: &EventAttributes) -> ChatMessage {
    let links = ConsoleLinks::from_attributes(attributes);
    let (link, label) = links.action(resource);

    let mut widgets = Vec::with_capacity(5);
    if resource == ResourceType::Rollout {
        widgets.push(key_value("Rollout", attributes.get(ROLLOUT_ID)));
        widgets.push(key_value("Target", attributes.get(TARGET_ID)));
    }
    widgets.push(key_value("Release", attributes.get(RELEASE_ID)));
    widgets.push(key_value("Status", attributes.get(ACTION)));
    widgets.push(key_value("Pipeline", attributes.get(DELIVERY_PIPELINE_ID)));

    let button = Widget::Buttons(vec![Button {
        text_button: TextButton {
            text: format!("View {}", label),
            on_click: OnClick {
                open_link: OpenLink {
                    url: link.to_string(),
                },
            },
        },
    }]);

    ChatMessage {
        cards: vec![Card {
            header: CardHeader {
                title: header_text(resource, attributes),
            },
            sections: vec![
                Section { widgets },
                Section {
                    widgets: vec![button],
                },
            ],
        }],
    }
}

/// Posts notifications to a Google Chat space.
pub struct GoogleChatAdapter {
    auth: ServiceAccountAuth,
    api_base: String,
    authenticated: bool,
    transport: HttpTransport,
}

impl GoogleChatAdapter {
    /// Creates an adapter that posts to the Google Chat API.
    ///
    /// `credentials` is the bot's service-account key (JSON). It is exchanged
    /// for an access token with the `chat.bot` scope on first use.
    pub fn new(credentials: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            auth: ServiceAccountAuth::new(credentials),
            api_base: GOOGLE_CHAT_API_URL.to_string(),
            authenticated: true,
            transport: HttpTransport::new()?,
        })
    }

    /// Points the adapter at a test double. Authentication is disabled for
    /// overridden endpoints.
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self.authenticated = false;
        self
    }

    /// Changes the API root while keeping authentication.
    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    fn messages_url(&self, channel: &str) -> Result<Url, NotifyError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| NotifyError::Endpoint(format!("{}: {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| NotifyError::Endpoint(format!("{} cannot be a base URL", self.api_base)))?
            .pop_if_empty()
            .extend(["v1", "spaces", channel, "messages"]);
        Ok(url)
    }
}

#[async_trait]
impl ChatAdapter for GoogleChatAdapter {
    fn name(&self) -> &str {
        "google"
    }

    #[instrument(skip(self, attributes))]
    async fn send_message(
        &self,
        channel: &str,
        attributes: &EventAttributes,
    ) -> Result<String, NotifyError> {
        let resource = ResourceType::from_attributes(attributes)?;
        let message = build_message(resource, attributes);
        let url = self.messages_url(channel)?;

        let token = if self.authenticated {
            Some(self.auth.access_token(&self.transport).await?)
        } else {
            None
        };

        debug!(%url, "Creating message in Google Chat space");
        self.transport
            .post_json(url.as_str(), token.as_deref(), &message)
            .await
    }
}
