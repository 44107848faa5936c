//! ML model loading and inference

pub mod inference;
pub mod loader;

pub use inference::{Classifier, InferenceResult, LinearClassifier, OnnxClassifier};
pub use loader::ModelLoader;
