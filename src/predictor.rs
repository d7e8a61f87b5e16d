//! Load-once inference context.
//!
//! Owns the schema, the precomputed column plans, the scaler and the model
//! bundles. Built once at startup and shared by reference (or `Arc`) across
//! requests; nothing in it changes after construction.

use crate::error::PredictionOutcome;
use crate::features::{FeatureReconstructor, FeatureVector, ScalerAdapter, ScalerTransform};
use crate::models::{Artifacts, ComparisonReport, InferenceEngine, ModelBundle, PredictionResult};
use crate::schema::FeatureSchema;
use crate::types::patient::PatientRecord;
use anyhow::Result;
use tracing::{debug, info};

pub struct ReadmissionPredictor {
    schema: FeatureSchema,
    reconstructor: FeatureReconstructor,
    scaler: Box<dyn ScalerTransform>,
    scaler_adapter: ScalerAdapter,
    engine: InferenceEngine,
    comparison: ComparisonReport,
}

impl ReadmissionPredictor {
    /// Build from the loaded artifact set
    pub fn from_artifacts(artifacts: Artifacts, default_model: &str) -> Result<Self> {
        Self::new(
            artifacts.schema,
            Box::new(artifacts.scaler),
            artifacts.bundles,
            artifacts.comparison,
            default_model,
        )
    }

    /// Resolve column plans and the scaler layout; fails if they disagree with the schema.
    pub fn new(
        schema: FeatureSchema,
        scaler: Box<dyn ScalerTransform>,
        bundles: Vec<ModelBundle>,
        comparison: ComparisonReport,
        default_model: &str,
    ) -> Result<Self> {
        let scaler_adapter = ScalerAdapter::new(&schema, scaler.as_ref())?;
        let reconstructor = FeatureReconstructor::new(&schema);
        let engine = InferenceEngine::new(bundles, default_model);

        if engine.bundle(default_model).is_none() {
            anyhow::bail!("Default model {} was not loaded", default_model);
        }

        info!(
            features = schema.len(),
            scaler_layout = ?scaler_adapter.layout(),
            models = ?engine.model_names(),
            default_model = %default_model,
            "Readmission predictor ready"
        );

        Ok(Self {
            schema,
            reconstructor,
            scaler,
            scaler_adapter,
            engine,
            comparison,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn comparison(&self) -> &ComparisonReport {
        &self.comparison
    }

    /// Raw vector for `record`, before scaling
    pub fn reconstruct(&self, record: &PatientRecord) -> FeatureVector {
        self.reconstructor.reconstruct(record)
    }

    /// Reconstruct and scale `record` into model input
    pub fn preprocess(&self, record: &PatientRecord) -> FeatureVector {
        let raw = self.reconstructor.reconstruct(record);
        let scaled = self.scaler_adapter.apply(&raw, self.scaler.as_ref());
        debug!(features = scaled.len(), "Patient record preprocessed");
        scaled
    }

    /// Preprocess `record` and predict with `model` (default model when `None`)
    pub fn assess(
        &self,
        record: &PatientRecord,
        model: Option<&str>,
    ) -> PredictionOutcome<PredictionResult> {
        let vector = self.preprocess(record);
        self.engine.predict(model, &vector)
    }
}
