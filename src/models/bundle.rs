//! Trained model bundles and the two calling conventions they expose

use super::metadata::ModelMetadata;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Model that outputs the positive-class probability directly (sigmoid network)
pub trait ProbabilityModel: Send + Sync {
    fn predict_probability(&self, features: &[f32]) -> Result<f64>;
}

/// Classifier exposing a native label plus class probabilities
pub trait LabelModel: Send + Sync {
    /// Native 0/1 decision at the model's own boundary
    fn predict_label(&self, features: &[f32]) -> Result<u8>;

    /// Probability of the positive (readmitted) class
    fn predict_positive_proba(&self, features: &[f32]) -> Result<f64>;
}

/// Output contract of a model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    ProbabilityNetwork,
    ThresholdedClassifier,
}

/// A loaded model, tagged with its calling convention once at load time
pub enum Model {
    ProbabilityNetwork(Box<dyn ProbabilityModel>),
    ThresholdedClassifier(Box<dyn LabelModel>),
}

impl Model {
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::ProbabilityNetwork(_) => ModelKind::ProbabilityNetwork,
            Model::ThresholdedClassifier(_) => ModelKind::ThresholdedClassifier,
        }
    }

    /// Positive-class probability, whichever convention the model follows
    pub fn infer(&self, features: &[f32]) -> Result<f64> {
        match self {
            Model::ProbabilityNetwork(model) => model.predict_probability(features),
            Model::ThresholdedClassifier(model) => model.predict_positive_proba(features),
        }
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Model").field(&self.kind()).finish()
    }
}

/// Model plus its training metadata, immutable after load
#[derive(Debug)]
pub struct ModelBundle {
    pub name: String,
    pub model: Model,
    pub metadata: ModelMetadata,
}

impl ModelBundle {
    pub fn new(name: impl Into<String>, model: Model, metadata: ModelMetadata) -> Self {
        Self {
            name: name.into(),
            model,
            metadata,
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.model.kind()
    }
}
