//! Training-time metadata shipped next to each model

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Held-out evaluation metrics recorded at training time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub roc_auc: f64,
    pub f1_score: f64,
    pub precision: f64,
    pub recall: f64,
    pub accuracy: f64,
}

/// Per-model metadata (`<model>_metadata.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub performance: PerformanceMetrics,
    /// Decision boundary tuned on held-out data, replacing the default 0.5 cut
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimal_threshold: Option<f64>,
}

impl ModelMetadata {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_json(path.as_ref(), "model metadata")
    }
}

/// Best model summary from the comparison report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestModel {
    pub name: String,
    pub roc_auc: f64,
    pub f1_score: f64,
    #[serde(default)]
    pub optimal_threshold: Option<f64>,
}

/// Dataset sizes the models were trained and evaluated on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub total_encounters: u64,
    pub train_size: u64,
    pub test_size: u64,
    pub n_features_engineered: u64,
}

/// Cross-model comparison (`model_comparison.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub model_comparison: HashMap<String, PerformanceMetrics>,
    pub best_model: BestModel,
    pub dataset_info: DatasetInfo,
}

impl ComparisonReport {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_json(path.as_ref(), "model comparison")
    }

    /// Model names ordered by ROC-AUC, best first
    pub fn ranked_by_roc_auc(&self) -> Vec<(&str, &PerformanceMetrics)> {
        let mut ranked: Vec<_> = self
            .model_comparison
            .iter()
            .map(|(name, perf)| (name.as_str(), perf))
            .collect();
        ranked.sort_by(|a, b| b.1.roc_auc.total_cmp(&a.1.roc_auc));
        ranked
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} {}", what, path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {} {}", what, path.display()))
}
