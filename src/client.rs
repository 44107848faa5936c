//! HTTP client for the prediction API, used by decision consumers.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::InferenceResult;
use crate::normalizer::normalize;
use crate::types::{ErrorResponse, PredictRequest, PredictResponse};
use std::time::Duration;
use tracing::{debug, warn};

/// Anything that can turn a feature vector into a model result
pub trait PredictionBackend {
    fn predict(&self, features: &[f64]) -> Result<InferenceResult, ClientError>;
}

/// Blocking client for a deployed inference service
pub struct InferenceClient {
    http: reqwest::blocking::Client,
    predict_url: String,
    feature_count: usize,
}

impl InferenceClient {
    /// Create a client for the service at `api_url`
    pub fn new(
        api_url: &str,
        timeout: Duration,
        feature_count: usize,
    ) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            predict_url: predict_url(api_url),
            feature_count,
        })
    }

    pub fn from_config(config: &ClientConfig, feature_count: usize) -> Result<Self, ClientError> {
        Self::new(
            &config.api_url,
            Duration::from_secs(config.timeout_secs),
            feature_count,
        )
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }
}

impl PredictionBackend for InferenceClient {
    fn predict(&self, features: &[f64]) -> Result<InferenceResult, ClientError> {
        let request = PredictRequest {
            features: normalize(features, self.feature_count).into_inner(),
        };

        let response = self
            .http
            .post(&self.predict_url)
            .json(&request)
            .send()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        debug!(url = %self.predict_url, status, "Prediction response received");

        decode_response(status, &body)
    }
}

/// `<api_url>predict`, tolerating a missing trailing slash
fn predict_url(api_url: &str) -> String {
    format!("{}/predict", api_url.trim_end_matches('/'))
}

/// Interpret a `/predict` answer
pub fn decode_response(status: u16, body: &[u8]) -> Result<InferenceResult, ClientError> {
    if status != 200 {
        let message = serde_json::from_slice::<ErrorResponse>(body)
            .map(|e| e.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());
        warn!(status, error = %message, "Inference service returned an error");
        return Err(ClientError::Status { status, message });
    }

    let response: PredictResponse =
        serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))?;

    if response.prediction > 1 || !(0.0..=1.0).contains(&response.probability) {
        return Err(ClientError::Decode(format!(
            "prediction {} / probability {} out of range",
            response.prediction, response.probability
        )));
    }

    Ok(response.into())
}
