//! Credit Scoring Service Library
//!
//! Serves a pre-trained credit default classifier over HTTP and provides
//! the consumer side: a client for the prediction endpoint, threshold
//! decisioning and a single-slot session cache.

pub mod api;
pub mod client;
pub mod config;
pub mod dataset;
pub mod decision;
pub mod error;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod service;
pub mod session;
pub mod types;

pub use api::{router, AppState};
pub use client::{InferenceClient, PredictionBackend};
pub use config::AppConfig;
pub use dataset::{ClientDataset, FeatureProvider};
pub use decision::{decide, Decision, DecisionEngine};
pub use error::{ClientError, ScoringError};
pub use models::{Classifier, InferenceResult, OnnxClassifier};
pub use normalizer::{normalize, FeatureNormalizer, NormalizedVector};
pub use service::InferenceService;
pub use session::{CachedSession, SessionCache};
