//! Model inference adapter for credit risk scoring

use crate::config::ModelConfig;
use crate::error::{ScoringError, ScoringResult};
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::normalizer::NormalizedVector;
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{debug, info};

/// Output of one model call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    /// Predicted class (1 = default risk)
    pub label: u8,
    /// Probability of class 1, in [0, 1]
    pub probability: f64,
}

impl InferenceResult {
    /// Validate raw model output.
    ///
    /// Probabilities slightly outside [0, 1] from float error are clamped.
    pub fn new(label: i64, probability: f64) -> ScoringResult<Self> {
        let label = match label {
            0 => 0,
            1 => 1,
            other => {
                return Err(ScoringError::Inference(format!(
                    "model returned unexpected class label {other}"
                )))
            }
        };

        if !probability.is_finite() {
            return Err(ScoringError::Inference(format!(
                "model returned non-finite probability {probability}"
            )));
        }

        Ok(Self {
            label,
            probability: probability.clamp(0.0, 1.0),
        })
    }

    /// Build a result from a class-1 probability alone.
    ///
    /// Class 1 wins only on a strict majority; an exact 0.5 tie is class 0.
    pub fn from_probability(probability: f64) -> ScoringResult<Self> {
        let label = if probability > 0.5 { 1 } else { 0 };
        Self::new(label, probability)
    }
}

/// A pre-trained binary classifier over fixed-width feature vectors.
///
/// Implementations must be deterministic: the same vector always yields
/// the same result.
pub trait Classifier: Send + Sync {
    /// Model name for logs and health reporting
    fn name(&self) -> &str;

    /// Classify a vector already normalized to the model's input width
    fn classify(&self, features: &NormalizedVector) -> ScoringResult<InferenceResult>;
}

/// Classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    /// `Session::run` needs exclusive access
    model: Mutex<LoadedModel>,
    name: String,
}

impl OnnxClassifier {
    /// Load the model artifact named in configuration
    pub fn from_config(config: &ModelConfig) -> ScoringResult<Self> {
        let loader = ModelLoader::with_threads(config.onnx_threads)
            .map_err(|e| ScoringError::Startup(format!("{e:#}")))?;
        let model = loader
            .load_model(&config.path, &config.name)
            .map_err(|e| ScoringError::Startup(format!("{e:#}")))?;

        info!(model = %config.name, "ONNX classifier ready");

        Ok(Self::from_loaded(model))
    }

    pub fn from_loaded(model: LoadedModel) -> Self {
        let name = model.name.clone();
        Self {
            model: Mutex::new(model),
            name,
        }
    }

    fn run(
        &self,
        model: &mut LoadedModel,
        features: &NormalizedVector,
    ) -> anyhow::Result<InferenceResult> {
        use ort::value::Tensor;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_f32()))?;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        let probability = extract_probability(&outputs, &model.probability_name, &model.name)?;

        let label = match model.label_name.as_deref().and_then(|n| outputs.get(n)) {
            Some(output) => {
                let (_, data) = output.try_extract_tensor::<i64>()?;
                data.first().copied()
            }
            None => None,
        };

        let result = match label {
            Some(label) => InferenceResult::new(label, probability)?,
            None => InferenceResult::from_probability(probability)?,
        };

        Ok(result)
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, features: &NormalizedVector) -> ScoringResult<InferenceResult> {
        let mut model = self
            .model
            .lock()
            .map_err(|e| ScoringError::Inference(format!("Lock error: {e}")))?;

        let result = self
            .run(&mut model, features)
            .map_err(|e| match e.downcast::<ScoringError>() {
                Ok(scoring) => scoring,
                Err(other) => ScoringError::Inference(format!("{other:#}")),
            })?;

        debug!(
            model = %self.name,
            label = result.label,
            probability = result.probability,
            "Model inference complete"
        );

        Ok(result)
    }
}

/// Extract the class-1 probability from model output.
///
/// Handles tensor outputs and the seq(map) outputs produced by gradient
/// boosting exports.
fn extract_probability(
    outputs: &ort::session::SessionOutputs,
    output_name: &str,
    model_name: &str,
) -> anyhow::Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        let dtype = output.dtype();

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            if let Some(prob) = class1_from_tensor(&dims, data) {
                debug!(model = %model_name, prob = prob, "Extracted from tensor");
                return Ok(prob);
            }
        }

        if DynSequenceValueType::can_downcast(&dtype) {
            return extract_from_sequence_map(output, model_name);
        }
    }

    // Fallback: scan every non-label output
    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }

        let dtype = output.dtype();

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            if let Some(prob) = class1_from_tensor(&dims, data) {
                debug!(model = %model_name, output = %name, prob = prob, "Extracted from tensor (fallback)");
                return Ok(prob);
            }
        }

        if DynSequenceValueType::can_downcast(&dtype) {
            if let Ok(prob) = extract_from_sequence_map(&output, model_name) {
                return Ok(prob);
            }
        }
    }

    anyhow::bail!("model {model_name} produced no readable probability output")
}

/// Extract probability from seq(map(int64, float)) format
fn extract_from_sequence_map(
    output: &ort::value::DynValue,
    model_name: &str,
) -> anyhow::Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    // Batch size is always 1
    let map_value = maps
        .first()
        .ok_or_else(|| anyhow::anyhow!("Empty probability sequence"))?;

    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
        debug!(model = %model_name, prob = *prob, "Extracted from seq(map)");
        return Ok(*prob as f64);
    }

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
        return Ok(1.0 - *prob as f64);
    }

    Err(anyhow::anyhow!("No class probability found in map"))
}

/// Class-1 probability from a `[1, C]`, `[C]` or `[1, 1]` tensor
fn class1_from_tensor(dims: &[i64], data: &[f32]) -> Option<f64> {
    let classes = match dims {
        [_, classes] | [classes] => *classes,
        _ => return None,
    };

    match classes {
        c if c >= 2 => data.get(1).map(|&v| v as f64),
        1 => data.first().map(|&v| v as f64),
        _ => None,
    }
}

/// Logistic regression over the normalized vector.
///
/// A pure in-process model, useful as a substitute for the ONNX artifact
/// in tests and local dry runs.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    name: String,
    weights: Vec<f64>,
    bias: f64,
}

impl LinearClassifier {
    pub fn new(name: impl Into<String>, weights: Vec<f64>, bias: f64) -> Self {
        Self {
            name: name.into(),
            weights,
            bias,
        }
    }

    fn logit(&self, features: &[f64]) -> f64 {
        self.bias
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

impl Classifier for LinearClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, features: &NormalizedVector) -> ScoringResult<InferenceResult> {
        if let Some(pos) = features.as_slice().iter().position(|v| !v.is_finite()) {
            return Err(ScoringError::Inference(format!(
                "feature {pos} is not a finite number"
            )));
        }

        let z = self.logit(features.as_slice());
        InferenceResult::from_probability(1.0 / (1.0 + (-z).exp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;

    #[test]
    fn test_result_validation() {
        let ok = InferenceResult::new(1, 0.8).unwrap();
        assert_eq!(ok.label, 1);

        let clamped = InferenceResult::new(0, -1e-7).unwrap();
        assert_eq!(clamped.probability, 0.0);

        assert!(InferenceResult::new(2, 0.5).is_err());
        assert!(InferenceResult::new(0, f64::NAN).is_err());
    }

    #[test]
    fn test_label_from_probability() {
        assert_eq!(InferenceResult::from_probability(0.5).unwrap().label, 0);
        assert_eq!(InferenceResult::from_probability(0.49).unwrap().label, 0);
        assert_eq!(InferenceResult::from_probability(0.51).unwrap().label, 1);
    }

    #[test]
    fn test_class1_from_tensor_shapes() {
        assert_eq!(class1_from_tensor(&[1, 2], &[0.25, 0.75]), Some(0.75));
        assert_eq!(class1_from_tensor(&[2], &[0.75, 0.25]), Some(0.25));
        assert_eq!(class1_from_tensor(&[1, 1], &[0.5]), Some(0.5));
        assert_eq!(class1_from_tensor(&[1, 2, 3], &[0.0; 6]), None);
        assert_eq!(class1_from_tensor(&[1, 2], &[0.1]), None);
    }

    #[test]
    fn test_linear_classifier_is_deterministic() {
        let model = LinearClassifier::new("linear", vec![0.3, -0.2, 0.05], -0.1);
        let input = normalize(&[1.0, 2.0, 3.0], 73);

        let first = model.classify(&input).unwrap();
        let second = model.classify(&input).unwrap();

        assert_eq!(first, second);
        assert!((0.0..=1.0).contains(&first.probability));
    }

    #[test]
    fn test_linear_classifier_zero_vector() {
        let model = LinearClassifier::new("linear", vec![1.0; 73], 0.0);
        let result = model.classify(&normalize(&[], 73)).unwrap();

        assert_eq!(result.probability, 0.5);
        assert_eq!(result.label, 0);
    }

    #[test]
    fn test_linear_classifier_rejects_nan() {
        let model = LinearClassifier::new("linear", vec![1.0; 73], 0.0);
        let err = model.classify(&normalize(&[f64::NAN], 73)).unwrap_err();
        assert!(matches!(err, ScoringError::Inference(_)));
    }
}
