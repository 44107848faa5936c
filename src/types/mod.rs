//! Wire types for the prediction API

pub mod request;

pub use request::{parse_features, ErrorResponse, PredictRequest, PredictResponse};
