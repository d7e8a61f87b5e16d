//! Artifact loader: preprocessing pipeline, ONNX models and their metadata

use super::bundle::{Model, ModelBundle, ModelKind};
use super::metadata::{ComparisonReport, ModelMetadata};
use super::onnx::OnnxModel;
use crate::config::{BundleConfig, ModelsConfig};
use crate::features::StandardScaler;
use crate::schema::{FeatureSchema, PreprocessingArtifact};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

pub const PREPROCESSING_FILE: &str = "preprocessing_pipeline.json";
pub const COMPARISON_FILE: &str = "model_comparison.json";

/// Everything loaded from the models directory, read-only after load
#[derive(Debug)]
pub struct Artifacts {
    pub schema: FeatureSchema,
    pub scaler: StandardScaler,
    pub bundles: Vec<ModelBundle>,
    pub comparison: ComparisonReport,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Initialize ONNX Runtime and create a loader
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load one ONNX model and tag it with its calling convention
    pub fn load_model(&self, path: &Path, name: &str, kind: ModelKind) -> Result<Model> {
        let model = OnnxModel::from_file(path, name, self.onnx_threads)?;
        Ok(match kind {
            ModelKind::ProbabilityNetwork => Model::ProbabilityNetwork(Box::new(model)),
            ModelKind::ThresholdedClassifier => Model::ThresholdedClassifier(Box::new(model)),
        })
    }
}

/// Paths and metadata for one configured model, checked before any session is built
struct PendingBundle<'a> {
    config: &'a BundleConfig,
    model_path: PathBuf,
    metadata: ModelMetadata,
}

/// Load every artifact named by `config`.
///
/// Any missing or corrupt file fails the whole load; there is no partial set.
pub fn load_artifacts(config: &ModelsConfig) -> Result<Artifacts> {
    let models_dir = Path::new(&config.models_dir);

    let (schema, scaler, comparison, pending) = load_descriptors(models_dir, config)?;

    let loader = ModelLoader::with_threads(config.onnx_threads)?;
    let mut bundles = Vec::with_capacity(pending.len());
    for item in pending {
        let model = loader
            .load_model(&item.model_path, &item.config.name, item.config.kind)
            .with_context(|| format!("Failed to load model {}", item.config.name))?;
        bundles.push(ModelBundle::new(item.config.name.clone(), model, item.metadata));
    }

    info!(
        count = bundles.len(),
        features = schema.len(),
        "Loaded {} models from {}",
        bundles.len(),
        models_dir.display()
    );

    Ok(Artifacts {
        schema,
        scaler,
        bundles,
        comparison,
    })
}

/// Read the JSON artifacts and check that every model file exists
fn load_descriptors<'a>(
    models_dir: &Path,
    config: &'a ModelsConfig,
) -> Result<(FeatureSchema, StandardScaler, ComparisonReport, Vec<PendingBundle<'a>>)> {
    let preprocessing = PreprocessingArtifact::from_path(models_dir.join(PREPROCESSING_FILE))?;
    preprocessing
        .scaler
        .validate()
        .context("Invalid scaler in preprocessing pipeline")?;
    let (schema, scaler) = preprocessing.into_parts();
    info!(
        features = schema.len(),
        numerical = schema.numerical().len(),
        "Feature schema loaded"
    );

    let comparison = ComparisonReport::from_path(models_dir.join(COMPARISON_FILE))?;

    let mut pending = Vec::with_capacity(config.bundles.len());
    for bundle in &config.bundles {
        let model_path = models_dir.join(bundle.model_file());
        if !model_path.exists() {
            anyhow::bail!("Model file not found: {}", model_path.display());
        }
        let metadata = ModelMetadata::from_path(models_dir.join(bundle.metadata_file()))?;
        pending.push(PendingBundle {
            config: bundle,
            model_path,
            metadata,
        });
    }

    Ok((schema, scaler, comparison, pending))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::fs;

    const METADATA: &str = r#"{"performance": {"roc_auc": 0.68, "f1_score": 0.28, "precision": 0.19, "recall": 0.55, "accuracy": 0.66}, "optimal_threshold": 0.42}"#;

    const COMPARISON: &str = r#"{
        "model_comparison": {"XGBoost_Optimized": {"roc_auc": 0.68, "f1_score": 0.28, "precision": 0.19, "recall": 0.55, "accuracy": 0.66}},
        "best_model": {"name": "XGBoost_Optimized", "roc_auc": 0.68, "f1_score": 0.28, "optimal_threshold": 0.42},
        "dataset_info": {"total_encounters": 101766, "train_size": 81412, "test_size": 20354, "n_features_engineered": 116}
    }"#;

    fn write_descriptors(dir: &Path) {
        fs::write(
            dir.join(PREPROCESSING_FILE),
            r#"{"feature_names": ["time_in_hospital", "gender_Male"],
                "numerical_features": ["time_in_hospital"],
                "scaler": {"mean": [4.4], "scale": [2.9]}}"#,
        )
        .unwrap();
        fs::write(dir.join(COMPARISON_FILE), COMPARISON).unwrap();
        for name in ["logistic_regression", "xgboost", "neural_network"] {
            fs::write(dir.join(format!("{}_metadata.json", name)), METADATA).unwrap();
        }
    }

    fn models_config(dir: &Path) -> ModelsConfig {
        let mut config = AppConfig::default().models;
        config.models_dir = dir.display().to_string();
        config
    }

    #[test]
    fn test_descriptors_load_when_models_present() {
        let dir = tempfile::tempdir().unwrap();
        write_descriptors(dir.path());
        for name in ["logistic_regression", "xgboost", "neural_network"] {
            fs::write(dir.path().join(format!("{}.onnx", name)), b"").unwrap();
        }
        let config = models_config(dir.path());

        let (schema, scaler, comparison, pending) = load_descriptors(dir.path(), &config).unwrap();

        assert_eq!(schema.len(), 2);
        assert_eq!(scaler.mean, vec![4.4]);
        assert_eq!(comparison.best_model.optimal_threshold, Some(0.42));
        assert_eq!(pending.len(), 3);
        assert_eq!(pending[1].metadata.optimal_threshold, Some(0.42));
    }

    #[test]
    fn test_missing_model_file_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        write_descriptors(dir.path());
        let config = models_config(dir.path());

        let err = load_artifacts(&config).unwrap_err();
        assert!(err.to_string().contains("logistic_regression.onnx"));
    }

    #[test]
    fn test_missing_preprocessing_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let config = models_config(dir.path());

        let err = load_artifacts(&config).unwrap_err();
        assert!(err.to_string().contains(PREPROCESSING_FILE));
    }

    #[test]
    fn test_ragged_scaler_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_descriptors(dir.path());
        fs::write(
            dir.path().join(PREPROCESSING_FILE),
            r#"{"feature_names": ["time_in_hospital"], "scaler": {"mean": [4.4, 1.0], "scale": [2.9]}}"#,
        )
        .unwrap();
        let config = models_config(dir.path());

        assert!(load_artifacts(&config).is_err());
    }
}
