//! Assessment request/response envelopes

use super::patient::PatientRecord;
use crate::error::PredictionError;
use crate::models::inference::PredictionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to assess one patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRequest {
    /// Caller-chosen identifier echoed in the response
    #[serde(default = "new_request_id")]
    pub request_id: String,

    /// Model to use; the configured default when absent
    #[serde(default)]
    pub model: Option<String>,

    pub patient: PatientRecord,
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl AssessmentRequest {
    pub fn new(patient: PatientRecord) -> Self {
        Self {
            request_id: new_request_id(),
            model: None,
            patient,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Outcome of one assessment; failed requests carry an error and no result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub response_id: String,
    pub request_id: String,
    pub model: String,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PredictionResult>,
    /// Risk message, or an explanation of the failure
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AssessmentResponse {
    pub fn success(request_id: &str, model: &str, result: PredictionResult) -> Self {
        Self {
            response_id: uuid::Uuid::new_v4().to_string(),
            request_id: request_id.to_string(),
            model: model.to_string(),
            status: ResponseStatus::Ok,
            message: result.message(),
            result: Some(result),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(request_id: &str, model: &str, error: &PredictionError) -> Self {
        Self {
            response_id: uuid::Uuid::new_v4().to_string(),
            request_id: request_id.to_string(),
            model: model.to_string(),
            status: ResponseStatus::Error,
            result: None,
            message: "Prediction failed. Please check that all input fields are filled correctly."
                .to_string(),
            error: Some(error.to_string()),
            timestamp: Utc::now(),
        }
    }

    /// Response to a payload that could not be decoded into a request
    pub fn rejected(request_id: Option<&str>, reason: impl std::fmt::Display) -> Self {
        Self {
            response_id: uuid::Uuid::new_v4().to_string(),
            request_id: request_id.unwrap_or_default().to_string(),
            model: String::new(),
            status: ResponseStatus::Error,
            result: None,
            message: "Request could not be read. Please check the request format.".to_string(),
            error: Some(reason.to_string()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }
}
