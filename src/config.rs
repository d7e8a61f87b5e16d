//! Configuration management for the readmission inference service

use crate::models::bundle::ModelKind;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "READMISSION_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming assessment requests
    pub requests_subject: String,
    /// Subject for results of requests that carry no reply subject
    pub results_subject: String,
    /// Queue group shared by service instances; plain subscription when unset
    #[serde(default)]
    pub queue_group: Option<String>,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding the preprocessing pipeline, models and metadata
    pub models_dir: String,
    /// Model used when a request does not name one
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Number of intra-op threads per ONNX session
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Models to load
    #[serde(default = "default_bundles")]
    pub bundles: Vec<BundleConfig>,
}

/// One model to load from `models_dir`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BundleConfig {
    pub name: String,
    pub kind: ModelKind,
}

impl BundleConfig {
    pub fn new(name: &str, kind: ModelKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }

    /// `<name>.onnx`
    pub fn model_file(&self) -> String {
        format!("{}.onnx", self.name)
    }

    /// `<name>_metadata.json`
    pub fn metadata_file(&self) -> String {
        format!("{}_metadata.json", self.name)
    }
}

fn default_model() -> String {
    "xgboost".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

fn default_bundles() -> Vec<BundleConfig> {
    vec![
        BundleConfig::new("logistic_regression", ModelKind::ThresholdedClassifier),
        BundleConfig::new("xgboost", ModelKind::ThresholdedClassifier),
        BundleConfig::new("neural_network", ModelKind::ProbabilityNetwork),
    ]
}

/// Request processing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum requests processed concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    pub metrics_interval_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            metrics_interval_secs: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `READMISSION_CONFIG` or `config/config.toml`
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/config.toml".to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path, with `READMISSION__*` overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("READMISSION").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the service cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.models.bundles.is_empty() {
            anyhow::bail!("No models configured");
        }
        if !self
            .models
            .bundles
            .iter()
            .any(|b| b.name == self.models.default_model)
        {
            anyhow::bail!(
                "Default model {} is not among the configured models",
                self.models.default_model
            );
        }
        if self.pipeline.workers == 0 {
            anyhow::bail!("pipeline.workers must be at least 1");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                requests_subject: "readmission.requests".to_string(),
                results_subject: "readmission.results".to_string(),
                queue_group: Some("readmission-inference".to_string()),
            },
            models: ModelsConfig {
                models_dir: "models".to_string(),
                default_model: default_model(),
                onnx_threads: 1,
                bundles: default_bundles(),
            },
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.models.default_model, "xgboost");
        assert_eq!(config.models.bundles.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_bundle_kinds() {
        let bundles = default_bundles();
        assert_eq!(bundles[1].kind, ModelKind::ThresholdedClassifier);
        assert_eq!(bundles[2].kind, ModelKind::ProbabilityNetwork);
        assert_eq!(bundles[2].model_file(), "neural_network.onnx");
        assert_eq!(bundles[0].metadata_file(), "logistic_regression_metadata.json");
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[nats]
url = "nats://nats:4222"
requests_subject = "req"
results_subject = "res"

[models]
models_dir = "/srv/models"
default_model = "neural_network"

[[models.bundles]]
name = "neural_network"
kind = "probability_network"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.models.models_dir, "/srv/models");
        assert_eq!(
            config.models.bundles,
            vec![BundleConfig::new("neural_network", ModelKind::ProbabilityNetwork)]
        );
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_unknown_default_model_rejected() {
        let mut config = AppConfig::default();
        config.models.default_model = "svm".to_string();
        assert!(config.validate().is_err());
    }
}
