//! Model bundles, artifact loading and prediction dispatch

pub mod bundle;
pub mod inference;
pub mod loader;
pub mod metadata;
pub mod onnx;

pub use bundle::{LabelModel, Model, ModelBundle, ModelKind, ProbabilityModel};
pub use inference::{predict, InferenceEngine, PredictionResult};
pub use loader::{load_artifacts, Artifacts, ModelLoader};
pub use metadata::{ComparisonReport, ModelMetadata, PerformanceMetrics};
