//! NATS publisher for assessment responses

use crate::types::assessment::AssessmentResponse;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes responses to the request's reply subject, or the results subject
#[derive(Clone)]
pub struct ResponsePublisher {
    client: Client,
    results_subject: String,
}

impl ResponsePublisher {
    pub fn new(client: Client, results_subject: &str) -> Self {
        Self {
            client,
            results_subject: results_subject.to_string(),
        }
    }

    /// Publish `response`, replying directly when the request carried a reply subject
    pub async fn publish(&self, response: &AssessmentResponse, reply: Option<Subject>) -> Result<()> {
        let payload = serde_json::to_vec(response)?;
        let subject = reply.unwrap_or_else(|| Subject::from(self.results_subject.as_str()));

        self.client.publish(subject.clone(), payload.into()).await?;

        debug!(
            subject = %subject,
            request_id = %response.request_id,
            status = ?response.status,
            "Published assessment response"
        );

        Ok(())
    }
}
