//! Diabetic Readmission Inference Library
//!
//! Rebuilds the engineered feature vector a readmission model was trained on
//! from a small patient record, scales it, and dispatches it to one of several
//! ONNX models with per-model decision thresholds.

pub mod config;
pub mod consumer;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod predictor;
pub mod producer;
pub mod risk;
pub mod schema;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use error::{PredictionError, PredictionOutcome};
pub use features::{reconstruct, scale, FeatureVector};
pub use models::inference::{predict, InferenceEngine, PredictionResult};
pub use predictor::ReadmissionPredictor;
pub use producer::ResponsePublisher;
pub use risk::{classify, RiskColor, RiskLevel};
pub use schema::FeatureSchema;
pub use types::{AssessmentRequest, AssessmentResponse, PatientRecord};
