//! A mock chat adapter for testing the entry points.

use async_trait::async_trait;
use deploybot::core::{ChatAdapter, EventAttributes, ResourceType};
use deploybot::notification::NotifyError;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, Default)]
pub struct MockChatAdapter {
    pub sent: Arc<Mutex<Vec<(String, EventAttributes)>>>,
}

impl MockChatAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_sent(&self) -> Vec<(String, EventAttributes)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatAdapter for MockChatAdapter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send_message(
        &self,
        channel: &str,
        attributes: &EventAttributes,
    ) -> Result<String, NotifyError> {
        ResourceType::from_attributes(attributes)?;
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), attributes.clone()));
        Ok("All Good".to_string())
    }
}
