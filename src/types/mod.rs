//! Wire types for the readmission inference service

pub mod assessment;
pub mod patient;

pub use assessment::{AssessmentRequest, AssessmentResponse, ResponseStatus};
pub use patient::PatientRecord;
