//! Scaler adapter: applies the fitted normalization to the numeric columns.
//!
//! The transform's parameters are positional, so the adapter has to feed it
//! rows in the exact layout it was fit on. That may be the numeric list, the
//! part of it the schema carries, the full N-column row, or whatever column
//! order the artifact recorded. Which one applies is read off the artifact
//! once at load time.

use super::FeatureVector;
use crate::schema::FeatureSchema;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A forward-only normalization fitted at training time.
pub trait ScalerTransform: Send + Sync {
    /// Width of the rows the transform was fit on
    fn n_features_in(&self) -> usize;

    /// Column names seen at fit time, when the artifact recorded them
    fn feature_names_in(&self) -> Option<&[String]> {
        None
    }

    /// Transform one row of exactly `n_features_in()` values
    fn transform(&self, row: &[f64]) -> Vec<f64>;
}

/// Per-feature `(x - mean) / scale` standardization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names_in: Option<Vec<String>>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self {
            mean,
            scale,
            feature_names_in: None,
        }
    }

    /// Check that the fitted parameter arrays agree with each other
    pub fn validate(&self) -> Result<()> {
        if self.mean.len() != self.scale.len() {
            anyhow::bail!(
                "Scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            );
        }
        if let Some(names) = &self.feature_names_in {
            if names.len() != self.mean.len() {
                anyhow::bail!(
                    "Scaler records {} feature names for {} parameters",
                    names.len(),
                    self.mean.len()
                );
            }
        }
        Ok(())
    }
}

impl ScalerTransform for StandardScaler {
    fn n_features_in(&self) -> usize {
        self.mean.len()
    }

    fn feature_names_in(&self) -> Option<&[String]> {
        self.feature_names_in.as_deref()
    }

    fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&x, (&mean, &scale))| {
                // zero-variance columns keep unit scale
                let scale = if scale == 0.0 { 1.0 } else { scale };
                (x - mean) / scale
            })
            .collect()
    }
}

/// Row layout the transform was fit on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitLayout {
    /// Fit on the whole numeric-feature list, in list order
    NumericSubset,
    /// Fit on the numeric features the schema actually carries, in list order
    PresentSubset,
    /// Fit on every schema column jointly
    FullRow,
    /// Fit on the columns recorded in `feature_names_in`, in that order
    Named,
}

/// Layout plus `(position, schema index)` pairs fed in and written back
type Plan = (FitLayout, Vec<(usize, usize)>, Vec<(usize, usize)>);

/// Scaling plan resolved once from the schema and the transform.
#[derive(Debug, Clone)]
pub struct ScalerAdapter {
    layout: FitLayout,
    width: usize,
    /// `(transform input position, schema index)` of every column fed to the transform
    inputs: Vec<(usize, usize)>,
    /// `(transform output position, schema index)` of every column written back
    outputs: Vec<(usize, usize)>,
}

impl ScalerAdapter {
    /// Introspect the fit layout; fails when the transform matches no known layout.
    pub fn new(schema: &FeatureSchema, transform: &dyn ScalerTransform) -> Result<Self> {
        let width = transform.n_features_in();
        let present = schema.numerical_positions();

        let skipped = schema.numerical().len() - present.len();
        if skipped > 0 {
            warn!(
                skipped = skipped,
                "Numeric features missing from schema will not be scaled"
            );
        }

        let (layout, inputs, outputs) = match transform.feature_names_in() {
            Some(names) => Self::named_plan(schema, names)?,
            None => Self::width_plan(schema, width, present)?,
        };

        debug!(layout = ?layout, width = width, scaled = outputs.len(), "Scaler layout resolved");

        Ok(Self {
            layout,
            width,
            inputs,
            outputs,
        })
    }

    /// Fit order taken from the names the transform recorded
    fn named_plan(schema: &FeatureSchema, names: &[String]) -> Result<Plan> {
        let mut inputs = Vec::with_capacity(names.len());
        for (pos, name) in names.iter().enumerate() {
            match schema.index_of(name) {
                Some(idx) => inputs.push((pos, idx)),
                None => anyhow::bail!("Scaler was fit on column {} which the schema lacks", name),
            }
        }

        let outputs = inputs
            .iter()
            .copied()
            .filter(|&(_, idx)| schema.is_numerical(&schema.names()[idx]))
            .collect();

        let layout = if names == schema.names() {
            FitLayout::FullRow
        } else {
            FitLayout::Named
        };
        Ok((layout, inputs, outputs))
    }

    /// Fit order inferred from the transform width alone
    fn width_plan(
        schema: &FeatureSchema,
        width: usize,
        present: Vec<(usize, usize)>,
    ) -> Result<Plan> {
        if width == schema.numerical().len() {
            Ok((FitLayout::NumericSubset, present.clone(), present))
        } else if width == present.len() {
            let compacted: Vec<(usize, usize)> = present
                .into_iter()
                .enumerate()
                .map(|(pos, (_, idx))| (pos, idx))
                .collect();
            Ok((FitLayout::PresentSubset, compacted.clone(), compacted))
        } else if width == schema.len() {
            let inputs = (0..schema.len()).map(|idx| (idx, idx)).collect();
            let outputs = present.into_iter().map(|(_, idx)| (idx, idx)).collect();
            Ok((FitLayout::FullRow, inputs, outputs))
        } else {
            anyhow::bail!(
                "Scaler expects {} features; schema has {} columns, {} numeric features, {} of them present",
                width,
                schema.len(),
                schema.numerical().len(),
                present.len()
            )
        }
    }

    pub fn layout(&self) -> FitLayout {
        self.layout
    }

    /// Scale the numeric columns of a raw vector; all other columns pass through.
    pub fn apply(&self, vector: &FeatureVector, transform: &dyn ScalerTransform) -> FeatureVector {
        if vector.is_scaled() {
            warn!("Feature vector already scaled, returning it unchanged");
            return vector.clone();
        }

        let values = vector.as_slice();
        let mut row = vec![0.0_f64; self.width];
        for &(pos, idx) in &self.inputs {
            row[pos] = values[idx] as f64;
        }

        let transformed = transform.transform(&row);

        let mut out = values.to_vec();
        for &(pos, idx) in &self.outputs {
            if let Some(&v) = transformed.get(pos) {
                out[idx] = v as f32;
            }
        }

        FeatureVector::scaled(out)
    }
}

/// Scale `vector` against `schema` with `transform`, resolving the fit layout on the fly.
///
/// Prefer a [`ScalerAdapter`] built once at load when scaling many rows.
pub fn scale(
    vector: &FeatureVector,
    schema: &FeatureSchema,
    transform: &dyn ScalerTransform,
) -> Result<FeatureVector> {
    let adapter = ScalerAdapter::new(schema, transform)?;
    Ok(adapter.apply(vector, transform))
}
