//! NATS subscriber for incoming assessment requests

use crate::types::assessment::AssessmentRequest;
use anyhow::{Context, Result};
use async_nats::{Client, Message, Subscriber};
use tracing::info;

/// Subscribes to assessment requests, optionally as a member of a queue group
/// so several service instances split the load.
pub struct RequestConsumer {
    client: Client,
    subject: String,
    queue_group: Option<String>,
}

impl RequestConsumer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
            queue_group: None,
        }
    }

    pub fn with_queue_group(mut self, queue_group: Option<String>) -> Self {
        self.queue_group = queue_group;
        self
    }

    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = match &self.queue_group {
            Some(group) => self
                .client
                .queue_subscribe(self.subject.clone(), group.clone())
                .await
                .with_context(|| format!("Failed to join queue group {} on {}", group, self.subject))?,
            None => self
                .client
                .subscribe(self.subject.clone())
                .await
                .with_context(|| format!("Failed to subscribe to {}", self.subject))?,
        };

        info!(
            subject = %self.subject,
            queue_group = ?self.queue_group,
            "Listening for assessment requests"
        );
        Ok(subscriber)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Decode a request payload
pub fn decode_request(message: &Message) -> Result<AssessmentRequest> {
    serde_json::from_slice(&message.payload).with_context(|| {
        format!(
            "Malformed assessment request on {} ({} bytes)",
            message.subject,
            message.payload.len()
        )
    })
}

/// Best-effort `request_id` of a payload that failed to decode as a request
pub fn request_id_hint(message: &Message) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(&message.payload).ok()?;
    value.get("request_id")?.as_str().map(str::to_string)
}
