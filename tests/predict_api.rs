//! HTTP tests for the prediction API
//!
//! The ONNX artifact is replaced by an in-process linear model so the
//! router can be driven without a model file.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use credit_scoring_service::{
    api::{router, AppState, WELCOME},
    models::LinearClassifier,
    service::InferenceService,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> Router {
    app_with_static("static")
}

fn app_with_static(static_dir: impl AsRef<Path>) -> Router {
    let model = LinearClassifier::new("linear", vec![0.02; 73], -0.3);
    let service = InferenceService::new(Arc::new(model), 73);
    router(Arc::new(AppState::new(service, static_dir.as_ref())))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn post_predict(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_prediction_with_73_zeros() {
    let body = json!({ "features": vec![0; 73] }).to_string();
    let (status, json) = post_predict(app(), body).await;

    assert_eq!(status, StatusCode::OK);

    let prediction = json["prediction"].as_u64().unwrap();
    let probability = json["probability"].as_f64().unwrap();
    assert!(prediction <= 1);
    assert!((0.0..=1.0).contains(&probability));
}

#[tokio::test]
async fn test_missing_features_is_bad_request() {
    let (status, json) = post_predict(app(), "{}").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"].as_str(),
        Some("Missing 'features' key in request data")
    );
}

#[tokio::test]
async fn test_any_length_is_accepted() {
    let app = app();

    let (short_status, short) = post_predict(app.clone(), json!({ "features": [] }).to_string()).await;
    let (long_status, long) =
        post_predict(app.clone(), json!({ "features": vec![0; 200] }).to_string()).await;

    assert_eq!(short_status, StatusCode::OK);
    assert_eq!(long_status, StatusCode::OK);
    // Both normalize to 73 zeros
    assert_eq!(short, long);
}

#[tokio::test]
async fn test_body_over_two_mebibytes_is_accepted() {
    let body = json!({ "features": vec![0; 1_200_000] }).to_string();
    assert!(body.len() > 2 * 1024 * 1024);

    let (status, json) = post_predict(app(), body).await;

    assert_eq!(status, StatusCode::OK);
    // Truncated to the first 73 zeros
    let (_, exact) = post_predict(app(), json!({ "features": vec![0; 73] }).to_string()).await;
    assert_eq!(json, exact);
}

#[tokio::test]
async fn test_identical_requests_give_identical_answers() {
    let app = app();
    let body = json!({ "features": [0.5, 1.5, -2.0, 3.25] }).to_string();

    let (_, first) = post_predict(app.clone(), body.clone()).await;
    let (_, second) = post_predict(app, body).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_non_numeric_feature_is_internal_error() {
    let (status, json) = post_predict(app(), r#"{"features": [1, "abc"]}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("could not convert"));
}

#[tokio::test]
async fn test_body_parsed_without_content_type() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .body(Body::from(r#"{"features": [1, 2, 3]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_home_and_health() {
    let app = app();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], WELCOME.as_bytes());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["model"], "linear");
    assert_eq!(json["feature_count"], 73);
}

#[tokio::test]
async fn test_favicon_missing_is_not_found() {
    let dir = std::env::temp_dir().join(format!("scoring-static-{}", Uuid::new_v4()));
    let (status, _) = get(app_with_static(&dir), "/favicon.ico").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favicon_served_from_static_dir() {
    let dir = std::env::temp_dir().join(format!("scoring-static-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let icon = [0u8, 0, 1, 0, 1, 0, 16, 16];
    std::fs::write(dir.join("favicon.ico"), icon).unwrap();

    let (status, body) = get(app_with_static(&dir), "/favicon.ico").await;
    std::fs::remove_dir_all(&dir).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, icon);
}
