//! Patient record to model input: reconstruction, category encoding, scaling

pub mod families;
pub mod reconstructor;
pub mod scaler;

pub use families::{EncodingTable, Family};
pub use reconstructor::{reconstruct, FeatureReconstructor};
pub use scaler::{scale, ScalerAdapter, ScalerTransform, StandardScaler};

/// Dense model input, index-aligned with the feature schema.
///
/// Numeric columns hold either raw magnitudes or scaled ones, never a mix;
/// `is_scaled` says which.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f32>,
    scaled: bool,
}

impl FeatureVector {
    /// Vector with raw numeric magnitudes
    pub fn raw(values: Vec<f32>) -> Self {
        Self {
            values,
            scaled: false,
        }
    }

    /// Vector whose numeric columns went through the scaler
    pub fn scaled(values: Vec<f32>) -> Self {
        Self {
            values,
            scaled: true,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_scaled(&self) -> bool {
        self.scaled
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}
