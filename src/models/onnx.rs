//! ONNX Runtime backed models

use super::bundle::{LabelModel, ProbabilityModel};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// A single ONNX session with its resolved input/output names.
///
/// `Session::run` needs exclusive access, so the session sits behind a lock;
/// the model itself is never mutated after load.
pub struct OnnxModel {
    name: String,
    session: RwLock<Session>,
    input_name: String,
    probability_output: String,
    label_output: Option<String>,
}

impl OnnxModel {
    /// Build a session from an `.onnx` file
    pub fn from_file<P: AsRef<Path>>(path: P, name: &str, intra_threads: usize) -> Result<Self> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = intra_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob") || o.name.contains("output"))
            .map(|o| o.name.clone())
            .or_else(|| session.outputs.last().map(|o| o.name.clone()))
            .unwrap_or_else(|| "probabilities".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        info!(
            model = %name,
            input = %input_name,
            probability_output = %probability_output,
            label_output = ?label_output,
            "Model loaded successfully"
        );

        Ok(Self {
            name: name.to_string(),
            session: RwLock::new(session),
            input_name,
            probability_output,
            label_output,
        })
    }

    /// Run the session on one row and hand the outputs to `extract`
    fn run<T>(&self, features: &[f32], extract: impl FnOnce(&SessionOutputs) -> Result<T>) -> Result<T> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, features.to_vec())).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;
        extract(&outputs)
    }
}

impl ProbabilityModel for OnnxModel {
    fn predict_probability(&self, features: &[f32]) -> Result<f64> {
        self.run(features, |outputs| {
            extract_probability(outputs, &self.probability_output, &self.name)
        })
    }
}

impl LabelModel for OnnxModel {
    fn predict_label(&self, features: &[f32]) -> Result<u8> {
        let label_output = self
            .label_output
            .as_deref()
            .with_context(|| format!("Model {} has no label output", self.name))?;

        self.run(features, |outputs| {
            let output = outputs
                .get(label_output)
                .with_context(|| format!("Output {} missing from model {}", label_output, self.name))?;
            let (_, data) = output.try_extract_tensor::<i64>()?;
            let label = data
                .first()
                .copied()
                .with_context(|| format!("Empty label output from model {}", self.name))?;
            debug!(model = %self.name, label = label, "Extracted native label");
            Ok(u8::from(label > 0))
        })
    }

    fn predict_positive_proba(&self, features: &[f32]) -> Result<f64> {
        self.predict_probability(features)
    }
}

/// Extract the positive-class probability from model outputs.
///
/// Handles tensor outputs (sigmoid networks, XGBoost, linear models) and
/// seq(map) outputs from ZipMap-style classifier exports.
fn extract_probability(outputs: &SessionOutputs, output_name: &str, model_name: &str) -> Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        if let Some(prob) = extract_any(&output, model_name) {
            return Ok(prob);
        }
    }

    // Fallback: iterate all outputs, skipping labels
    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }
        if let Some(prob) = extract_any(&output, model_name) {
            debug!(model = %model_name, output = %name, prob = prob, "Extracted from fallback output");
            return Ok(prob);
        }
    }

    warn!(model = %model_name, "Could not extract probability from any output");
    Err(anyhow::anyhow!("No probability output found for model {}", model_name))
}

fn extract_any(output: &DynValue, model_name: &str) -> Option<f64> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        let prob = positive_from_tensor(&dims, data)?;
        debug!(model = %model_name, prob = prob, "Extracted from tensor");
        return Some(prob);
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return extract_from_sequence_map(output, model_name).ok();
    }

    None
}

/// Positive-class probability from a `[batch, classes]`, `[batch, 1]` or `[classes]` tensor
fn positive_from_tensor(dims: &[i64], data: &[f32]) -> Option<f64> {
    let classes = match dims {
        [_, classes] => *classes,
        [classes] => *classes,
        _ => return data.last().map(|&v| v as f64),
    };

    match classes {
        c if c >= 2 => data.get(1).map(|&v| v as f64),
        1 => data.first().map(|&v| v as f64),
        _ => None,
    }
}

/// Extract the class-1 probability from seq(map(int64, float))
fn extract_from_sequence_map(output: &DynValue, model_name: &str) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    let map_value = maps
        .first()
        .ok_or_else(|| anyhow::anyhow!("Empty sequence"))?;

    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
        debug!(model = %model_name, prob = *prob, "Extracted from seq(map)");
        return Ok(*prob as f64);
    }
    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
        return Ok(1.0 - *prob as f64);
    }

    Err(anyhow::anyhow!("No probability found in map"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_class_tensor_takes_positive_column() {
        assert_eq!(positive_from_tensor(&[1, 2], &[0.25, 0.75]), Some(0.75));
    }

    #[test]
    fn test_single_output_tensor() {
        assert_eq!(positive_from_tensor(&[1, 1], &[0.5]), Some(0.5));
        assert_eq!(positive_from_tensor(&[2], &[0.6, 0.4]), Some(0.4f32 as f64));
    }

    #[test]
    fn test_unusual_shape_takes_last_value() {
        assert_eq!(positive_from_tensor(&[1, 1, 1], &[0.125]), Some(0.125));
        assert_eq!(positive_from_tensor(&[1, 0], &[]), None);
    }
}
