//! Prediction dispatch across model families

use crate::error::{PredictionError, PredictionOutcome};
use crate::features::FeatureVector;
use crate::models::bundle::{Model, ModelBundle, ModelKind};
use crate::models::metadata::PerformanceMetrics;
use crate::risk::{classify, RiskColor, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, warn};

/// Cut applied to probability networks, and to classifiers without a tuned threshold
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// Uniform result of model inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 1 = predicted readmission within 30 days
    pub prediction: u8,
    /// Positive-class probability (0.0 - 1.0)
    pub probability: f64,
    pub risk_level: RiskLevel,
    pub risk_color: RiskColor,
    /// Training-time metrics of the model that produced this result
    pub model_performance: PerformanceMetrics,
}

impl PredictionResult {
    /// Operator-facing message for this result's tier
    pub fn message(&self) -> String {
        self.risk_level.message(self.probability)
    }
}

/// Run `bundle` on a preprocessed vector and normalize its output.
///
/// Any model-side failure is reported as [`PredictionError::Inference`]; no
/// partial result is returned and nothing is retried.
pub fn predict(bundle: &ModelBundle, vector: &FeatureVector) -> PredictionOutcome<PredictionResult> {
    if !vector.is_scaled() {
        warn!(model = %bundle.name, "Predicting on an unscaled feature vector");
    }
    let features = vector.as_slice();

    let probability = checked(bundle.model.infer(features), &bundle.name)?;

    let prediction = match &bundle.model {
        Model::ProbabilityNetwork(_) => u8::from(probability > DEFAULT_DECISION_THRESHOLD),
        Model::ThresholdedClassifier(model) => {
            let native = model
                .predict_label(features)
                .map_err(|e| failed(&bundle.name, e))?;

            // a tuned threshold takes precedence over the model's own boundary
            match bundle.metadata.optimal_threshold {
                Some(threshold) => u8::from(probability >= threshold),
                None => native,
            }
        }
    };

    let (risk_level, risk_color) = classify(probability);

    debug!(
        model = %bundle.name,
        kind = ?bundle.kind(),
        prediction = prediction,
        probability = probability,
        risk_level = %risk_level,
        "Prediction complete"
    );

    Ok(PredictionResult {
        prediction,
        probability,
        risk_level,
        risk_color,
        model_performance: bundle.metadata.performance,
    })
}

fn failed(model: &str, cause: anyhow::Error) -> PredictionError {
    error!(model = %model, error = %cause, "Model inference failed");
    PredictionError::inference(cause)
}

fn checked(probability: anyhow::Result<f64>, model: &str) -> PredictionOutcome<f64> {
    let probability = probability.map_err(|e| failed(model, e))?;
    if !probability.is_finite() {
        return Err(failed(
            model,
            anyhow::anyhow!("model returned non-finite probability {}", probability),
        ));
    }
    Ok(probability.clamp(0.0, 1.0))
}

/// Set of loaded model bundles, keyed by name
pub struct InferenceEngine {
    bundles: HashMap<String, ModelBundle>,
    default_model: String,
}

impl InferenceEngine {
    pub fn new(bundles: Vec<ModelBundle>, default_model: impl Into<String>) -> Self {
        Self {
            bundles: bundles
                .into_iter()
                .map(|bundle| (bundle.name.clone(), bundle))
                .collect(),
            default_model: default_model.into(),
        }
    }

    /// Get the number of loaded models
    pub fn model_count(&self) -> usize {
        self.bundles.len()
    }

    /// Get loaded model names, sorted
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bundles.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn bundle(&self, name: &str) -> Option<&ModelBundle> {
        self.bundles.get(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ModelKind> {
        self.bundle(name).map(ModelBundle::kind)
    }

    /// Predict with the named model, or the default model when `model` is `None`
    pub fn predict(
        &self,
        model: Option<&str>,
        vector: &FeatureVector,
    ) -> PredictionOutcome<PredictionResult> {
        let name = model.unwrap_or(&self.default_model);
        let bundle = self
            .bundle(name)
            .ok_or_else(|| PredictionError::UnknownModel(name.to_string()))?;
        predict(bundle, vector)
    }
}
