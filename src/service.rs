//! Inference service: request body in, raw model output out.
//!
//! Holds the loaded classifier as a shared read-only handle. Each request
//! runs parse → normalize → classify to completion; nothing is kept between
//! requests apart from metrics.

use crate::error::{ScoringError, ScoringResult};
use crate::metrics::{RequestOutcome, ServiceMetrics};
use crate::models::{Classifier, InferenceResult};
use crate::normalizer::FeatureNormalizer;
use crate::types::{parse_features, PredictResponse};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

pub struct InferenceService {
    classifier: Arc<dyn Classifier>,
    normalizer: FeatureNormalizer,
    metrics: Arc<ServiceMetrics>,
}

impl InferenceService {
    pub fn new(classifier: Arc<dyn Classifier>, feature_count: usize) -> Self {
        Self::with_metrics(classifier, feature_count, Arc::new(ServiceMetrics::new()))
    }

    pub fn with_metrics(
        classifier: Arc<dyn Classifier>,
        feature_count: usize,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            classifier,
            normalizer: FeatureNormalizer::new(feature_count),
            metrics,
        }
    }

    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn feature_count(&self) -> usize {
        self.normalizer.expected_len()
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    /// Normalize a feature vector and run the model on it.
    pub fn predict(&self, features: Vec<f64>) -> ScoringResult<InferenceResult> {
        let normalized = self.normalizer.normalize(features);

        if normalized.coercion().is_altered() {
            debug!(
                original_len = normalized.original_len(),
                expected_len = normalized.len(),
                coercion = ?normalized.coercion(),
                "Feature vector reshaped to model input width"
            );
        }
        self.metrics.record_coercion(normalized.coercion());

        let result = self.classifier.classify(&normalized)?;
        self.metrics.record_probability(result.probability);

        Ok(result)
    }

    /// Handle a raw `/predict` body.
    pub fn handle(&self, body: &[u8]) -> ScoringResult<PredictResponse> {
        let start = Instant::now();

        let outcome = parse_features(body).and_then(|features| self.predict(features));
        let latency = start.elapsed();

        match &outcome {
            Ok(result) => {
                self.metrics.record_request(RequestOutcome::Completed, latency);
                debug!(
                    prediction = result.label,
                    probability = result.probability,
                    latency_us = latency.as_micros(),
                    "Prediction completed"
                );
            }
            Err(e @ ScoringError::Validation(_)) => {
                self.metrics.record_request(RequestOutcome::BadRequest, latency);
                warn!(error = %e, "Rejected prediction request");
            }
            Err(e) => {
                self.metrics.record_request(RequestOutcome::InternalError, latency);
                error!(error = %e, "Prediction failed");
            }
        }

        outcome.map(PredictResponse::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MISSING_FEATURES;
    use crate::models::LinearClassifier;
    use std::sync::atomic::Ordering;

    fn service() -> InferenceService {
        let model = LinearClassifier::new("linear", vec![0.01; 73], -0.5);
        InferenceService::new(Arc::new(model), 73)
    }

    #[test]
    fn test_zero_vector_prediction() {
        let body = serde_json::to_vec(&serde_json::json!({ "features": vec![0; 73] })).unwrap();
        let response = service().handle(&body).unwrap();

        assert!(response.prediction <= 1);
        assert!((0.0..=1.0).contains(&response.probability));
    }

    #[test]
    fn test_missing_features() {
        let svc = service();
        let err = svc.handle(b"{}").unwrap_err();

        assert_eq!(err.to_string(), MISSING_FEATURES);
        assert_eq!(svc.metrics().bad_requests.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_length_drift_is_absorbed() {
        let svc = service();

        let short = svc.predict(vec![1.0, 2.0]).unwrap();
        let padded = svc
            .predict([vec![1.0, 2.0], vec![0.0; 71]].concat())
            .unwrap();
        assert_eq!(short, padded);

        let long = svc.predict(vec![1.0; 100]).unwrap();
        let exact = svc.predict(vec![1.0; 73]).unwrap();
        assert_eq!(long, exact);

        assert_eq!(svc.metrics().vectors_padded.load(Ordering::Relaxed), 1);
        assert_eq!(svc.metrics().vectors_truncated.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_model_failure_is_internal_error() {
        let svc = service();
        let err = svc.handle(br#"{"features": [null]}"#).unwrap_err();

        assert!(matches!(err, ScoringError::Inference(_)));
        assert_eq!(svc.metrics().internal_errors.load(Ordering::Relaxed), 1);
    }
}
