//! Shared fixtures for unit tests: a representative frozen schema and stub models

use crate::features::StandardScaler;
use crate::models::bundle::{LabelModel, Model, ModelBundle, ProbabilityModel};
use crate::models::metadata::{
    BestModel, ComparisonReport, DatasetInfo, ModelMetadata, PerformanceMetrics,
};
use crate::schema::{FeatureSchema, NUMERICAL_FEATURES};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const DIAGNOSES_WITH_COLUMNS: [&str; 8] = [
    "Diabetes",
    "Digestive",
    "Genitourinary",
    "Injury",
    "Musculoskeletal",
    "Neoplasms",
    "Other",
    "Respiratory",
];

/// Schema shaped like a drop-first training run: Female, AfricanAmerican,
/// Age_0_30, Circulatory and High_HbA1c_MedChanged have no columns.
pub fn fixture_schema() -> FeatureSchema {
    let mut names: Vec<String> = NUMERICAL_FEATURES.iter().map(|s| s.to_string()).collect();

    names.push("gender_Male".to_string());
    for race in ["Asian", "Caucasian", "Hispanic", "Other"] {
        names.push(format!("race_{}", race));
    }
    for age in ["Age_30_60", "Age_60_plus"] {
        names.push(format!("age_group_{}", age));
    }
    for n in 1..=3 {
        for diagnosis in DIAGNOSES_WITH_COLUMNS {
            names.push(format!("diag_{}_grouped_{}", n, diagnosis));
        }
    }
    for hba1c in ["High_HbA1c_NoMedChange", "No_HbA1c_Test", "Normal_HbA1c"] {
        names.push(format!("HbA1c_category_{}", hba1c));
    }
    names.push("diabetesMed_Yes".to_string());
    names.push("payer_code_HM".to_string());
    names.push("payer_code_MC".to_string());
    for medication in ["metformin_Steady", "insulin_Steady", "insulin_Up"] {
        names.push(medication.to_string());
    }
    names.push("long_stay_high_procedures".to_string());
    names.push("elderly_polypharmacy".to_string());
    for cross in [
        "Normal_HbA1c_Diabetes",
        "Normal_HbA1c_Circulatory",
        "High_HbA1c_NoMedChange_Diabetes",
    ] {
        names.push(format!("HbA1c_Diag_interaction_{}", cross));
    }

    FeatureSchema::new(
        names,
        NUMERICAL_FEATURES.iter().map(|s| s.to_string()).collect(),
    )
}

/// Subset-fit scaler: time_in_hospital has mean 4 and scale 2, the rest are identity
pub fn fixture_scaler(schema: &FeatureSchema) -> StandardScaler {
    let width = schema.numerical().len();
    let mut mean = vec![0.0; width];
    let mut scale = vec![1.0; width];
    mean[0] = 4.0;
    scale[0] = 2.0;
    StandardScaler::new(mean, scale)
}

pub fn fixture_performance() -> PerformanceMetrics {
    PerformanceMetrics {
        roc_auc: 0.68,
        f1_score: 0.28,
        precision: 0.19,
        recall: 0.55,
        accuracy: 0.66,
    }
}

pub fn fixture_comparison() -> ComparisonReport {
    let mut model_comparison = HashMap::new();
    model_comparison.insert("XGBoost_Optimized".to_string(), fixture_performance());

    ComparisonReport {
        model_comparison,
        best_model: BestModel {
            name: "XGBoost_Optimized".to_string(),
            roc_auc: 0.68,
            f1_score: 0.28,
            optimal_threshold: Some(0.42),
        },
        dataset_info: DatasetInfo {
            total_encounters: 101_766,
            train_size: 81_412,
            test_size: 20_354,
            n_features_engineered: 116,
        },
    }
}

/// Bundle with metadata carrying no tuned threshold
pub fn bundle(name: &str, model: Model) -> ModelBundle {
    ModelBundle::new(
        name,
        model,
        ModelMetadata {
            performance: fixture_performance(),
            optimal_threshold: None,
        },
    )
}

/// Classifier bundle with a fixed native label and probability
pub fn classifier_bundle(name: &str, label: u8, probability: f64, threshold: Option<f64>) -> ModelBundle {
    ModelBundle::new(
        name,
        Model::ThresholdedClassifier(Box::new(FixedClassifier { label, probability })),
        ModelMetadata {
            performance: fixture_performance(),
            optimal_threshold: threshold,
        },
    )
}

pub struct FixedProbability(pub f64);

impl ProbabilityModel for FixedProbability {
    fn predict_probability(&self, _features: &[f32]) -> Result<f64> {
        Ok(self.0)
    }
}

pub struct FixedClassifier {
    pub label: u8,
    pub probability: f64,
}

impl LabelModel for FixedClassifier {
    fn predict_label(&self, _features: &[f32]) -> Result<u8> {
        Ok(self.label)
    }

    fn predict_positive_proba(&self, _features: &[f32]) -> Result<f64> {
        Ok(self.probability)
    }
}

/// Model whose every call fails with the given message
pub struct FailingModel(pub String);

impl ProbabilityModel for FailingModel {
    fn predict_probability(&self, _features: &[f32]) -> Result<f64> {
        Err(anyhow::anyhow!("{}", self.0))
    }
}

impl LabelModel for FailingModel {
    fn predict_label(&self, _features: &[f32]) -> Result<u8> {
        Err(anyhow::anyhow!("{}", self.0))
    }

    fn predict_positive_proba(&self, _features: &[f32]) -> Result<f64> {
        Err(anyhow::anyhow!("{}", self.0))
    }
}

/// Classifier with a working probability output and a failing label output
pub struct BrokenLabel(pub f64);

impl LabelModel for BrokenLabel {
    fn predict_label(&self, _features: &[f32]) -> Result<u8> {
        Err(anyhow::anyhow!("label output missing"))
    }

    fn predict_positive_proba(&self, _features: &[f32]) -> Result<f64> {
        Ok(self.0)
    }
}

/// Network stub that keeps the last vector it was given
pub struct RecordingModel {
    probability: f64,
    seen: Arc<Mutex<Vec<f32>>>,
}

impl RecordingModel {
    pub fn new(probability: f64) -> (Self, Arc<Mutex<Vec<f32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                probability,
                seen: Arc::clone(&seen),
            },
            seen,
        )
    }
}

impl ProbabilityModel for RecordingModel {
    fn predict_probability(&self, features: &[f32]) -> Result<f64> {
        *self.seen.lock().unwrap() = features.to_vec();
        Ok(self.probability)
    }
}
