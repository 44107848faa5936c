//! `/predict` request and response bodies

use crate::error::{ScoringError, ScoringResult};
use crate::models::InferenceResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body sent by clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

/// Successful prediction. Carries the raw model output; thresholding is
/// left to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Predicted class (0 or 1)
    pub prediction: u8,
    /// Probability of class 1
    pub probability: f64,
}

impl From<InferenceResult> for PredictResponse {
    fn from(result: InferenceResult) -> Self {
        Self {
            prediction: result.label,
            probability: result.probability,
        }
    }
}

impl From<PredictResponse> for InferenceResult {
    fn from(response: PredictResponse) -> Self {
        Self {
            label: response.prediction,
            probability: response.probability,
        }
    }
}

/// Error body for 4xx/5xx answers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Parse a raw request body into a feature vector.
///
/// The body is read as JSON whatever its content type. A body that is not
/// a JSON object with a `features` key is a validation error; a `features`
/// value that cannot be read as numbers fails at the inference stage.
pub fn parse_features(body: &[u8]) -> ScoringResult<Vec<f64>> {
    let data: Value = serde_json::from_slice(body)
        .map_err(|e| ScoringError::Validation(format!("Invalid JSON body: {e}")))?;

    let features = data
        .get("features")
        .ok_or_else(ScoringError::missing_features)?;

    let items = features.as_array().ok_or_else(|| {
        ScoringError::Inference(format!(
            "'features' must be an array of numbers, got {}",
            type_name(features)
        ))
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, value)| coerce_feature(i, value))
        .collect()
}

fn coerce_feature(index: usize, value: &Value) -> ScoringResult<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            ScoringError::Inference(format!("could not convert feature {index} to float: {n}"))
        }),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        // Missing value; tree models route NaN explicitly
        Value::Null => Ok(f64::NAN),
        other => Err(ScoringError::Inference(format!(
            "could not convert feature {index} to float: {other}"
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
