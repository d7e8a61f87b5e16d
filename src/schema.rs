//! Frozen training-time feature schema.
//!
//! The schema is read once from the preprocessing artifact and shared
//! read-only by the reconstructor and the scaler adapter.

use crate::features::scaler::StandardScaler;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Numerical columns scaled at training time, in fit order.
pub const NUMERICAL_FEATURES: [&str; 14] = [
    "time_in_hospital",
    "num_lab_procedures",
    "num_procedures",
    "num_medications",
    "number_emergency",
    "number_inpatient",
    "number_outpatient",
    "num_medications_prescribed",
    "admission_type_id",
    "discharge_disposition_id",
    "admission_source_id",
    "medical_specialty",
    "number_diagnoses",
    "num_medications_changed",
];

fn default_numerical_features() -> Vec<String> {
    NUMERICAL_FEATURES.iter().map(|s| s.to_string()).collect()
}

/// On-disk preprocessing pipeline (`preprocessing_pipeline.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingArtifact {
    /// Every column the models expect, in training order
    pub feature_names: Vec<String>,
    /// Columns the scaler was fit on, in fit order
    #[serde(default = "default_numerical_features")]
    pub numerical_features: Vec<String>,
    /// Fitted scaler parameters
    pub scaler: StandardScaler,
}

impl PreprocessingArtifact {
    /// Read and parse the preprocessing artifact
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read preprocessing pipeline {}", path.display()))?;
        let artifact: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse preprocessing pipeline {}", path.display()))?;

        if artifact.feature_names.is_empty() {
            anyhow::bail!("Preprocessing pipeline {} lists no features", path.display());
        }

        Ok(artifact)
    }

    /// Split into the schema and the scaler
    pub fn into_parts(self) -> (FeatureSchema, StandardScaler) {
        (
            FeatureSchema::new(self.feature_names, self.numerical_features),
            self.scaler,
        )
    }
}

/// Ordered column names plus the numeric subset requiring scaling.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Vec<String>,
    index: HashMap<String, usize>,
    numerical: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>, numerical: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }

        Self {
            names,
            index,
            numerical,
        }
    }

    /// Number of columns (N)
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column names in training order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Numeric columns in scaler fit order (may name columns the schema lacks)
    pub fn numerical(&self) -> &[String] {
        &self.numerical
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Columns starting with `prefix`, with the prefix stripped
    pub fn columns_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        self.names
            .iter()
            .enumerate()
            .filter_map(move |(i, name)| name.strip_prefix(prefix).map(|value| (i, value)))
    }

    /// Whether `name` is on the numeric-feature list
    pub fn is_numerical(&self, name: &str) -> bool {
        self.numerical.iter().any(|n| n == name)
    }

    /// `(fit position, schema index)` for every numeric column present in the schema.
    ///
    /// Names missing from the schema are skipped.
    pub fn numerical_positions(&self) -> Vec<(usize, usize)> {
        self.numerical
            .iter()
            .enumerate()
            .filter_map(|(pos, name)| self.index_of(name).map(|idx| (pos, idx)))
            .collect()
    }
}
