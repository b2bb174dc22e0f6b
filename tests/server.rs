//! Integration test: predictor pages and JSON API

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::path::Path;
use std::sync::Arc;
use student_status_predictor::server::{create_router, AppState};
use student_status_predictor::AppConfig;
use tempfile::TempDir;
use tower::ServiceExt;

const DATASET: &str = "Age_at_enrollment,Gender,Status\n19,1,Graduate\n23,0,Dropout\n";

fn write_artifacts(root: &Path) -> AppConfig {
    write_artifacts_with_dataset(root, DATASET)
}

fn write_artifacts_with_dataset(root: &Path, dataset: &str) -> AppConfig {
    std::fs::create_dir_all(root.join("data")).unwrap();
    std::fs::copy(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/best_model.onnx"),
        root.join("best_model.onnx"),
    )
    .unwrap();
    std::fs::write(
        root.join("scaler.json"),
        r#"{"kind":"standard","mean":[20.0,0.5],"scale":[5.0,0.5]}"#,
    )
    .unwrap();
    std::fs::write(
        root.join("encoder.json"),
        r#"{"kind":"label_encoder","classes":["Dropout","Graduate"]}"#,
    )
    .unwrap();
    std::fs::write(root.join("data/data_fix.csv"), dataset).unwrap();

    let mut config = AppConfig::default();
    config.artifacts.model_path = root.join("best_model.onnx").display().to_string();
    config.artifacts.scaler_path = root.join("scaler.json").display().to_string();
    config.artifacts.encoder_path = root.join("encoder.json").display().to_string();
    config.artifacts.dataset_path = root.join("data/data_fix.csv").display().to_string();
    config
}

fn test_app() -> (TempDir, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    let config = write_artifacts(dir.path());
    let state = Arc::new(AppState::from_config(&config));
    assert!(state.is_ready());
    (dir, create_router(state))
}

fn unavailable_app() -> (TempDir, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    let config = write_artifacts(dir.path());
    std::fs::remove_file(&config.artifacts.encoder_path).unwrap();
    let state = Arc::new(AppState::from_config(&config));
    (dir, create_router(state))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_root_serves_form() {
    let (_dir, app) = test_app();
    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("Student Academic Status Predictor"));
    assert!(html.contains(r#"type="range" name="Age_at_enrollment""#));
    assert!(html.contains(r#"<select name="Gender">"#));
    assert!(html.contains("<h3>Entered Data</h3>"));
    assert!(!html.contains("RESULT:"));
    assert!(html.contains(concat!("Academic Status Prediction Dashboard v", env!("CARGO_PKG_VERSION"))));
}

#[tokio::test]
async fn test_form_submission_shows_result() {
    let (_dir, app) = test_app();
    let response = app
        .oneshot(post_form("Age_at_enrollment=30&Gender=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("RESULT: Graduate"));
    assert!(html.contains("complete their studies successfully"));
    assert!(html.contains("Confidence: <strong>79.41%</strong>"));
    assert!(html.contains("<td>Age_at_enrollment</td><td>30</td>"));
}

#[tokio::test]
async fn test_form_submission_with_invalid_value_shows_inline_error() {
    let (_dir, app) = test_app();
    let response = app
        .oneshot(post_form("Age_at_enrollment=90&Gender=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("An error occurred during prediction"));
    assert!(html.contains("Age_at_enrollment"));
    assert!(!html.contains("RESULT:"));
    assert!(html.contains("<form"));
}

#[tokio::test]
async fn test_rejected_value_keeps_other_submitted_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_artifacts_with_dataset(
        dir.path(),
        "Age_at_enrollment,Gender,Admission_grade,Status\n19,1,120.0,Graduate\n",
    );
    let app = create_router(Arc::new(AppState::from_config(&config)));

    let response = app
        .oneshot(post_form("Age_at_enrollment=30&Gender=1&Admission_grade=abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains(r#"Invalid value &quot;abc&quot; for Admission_grade"#));
    assert!(html.contains("<td>Age_at_enrollment</td><td>30</td>"));
    assert!(html.contains(r#"name="Age_at_enrollment" min="15" max="60" step="1" value="30""#));
    assert!(html.contains(r#"<option value="1" selected>"#));
    assert!(html.contains(r#"type="text" name="Admission_grade" value="abc""#));
    assert!(!html.contains("<td>Age_at_enrollment</td><td>20</td>"));
    assert!(!html.contains(r#"value="20""#));
    assert!(!html.contains("RESULT:"));
}

#[tokio::test]
async fn test_api_schema_lists_features_in_order() {
    let (_dir, app) = test_app();
    let response = app.oneshot(get("/api/schema")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    let features = json["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["name"], "Age_at_enrollment");
    assert_eq!(features[0]["widget"]["kind"], "bounded_integer");
    assert_eq!(features[0]["widget"]["min"], 15);
    assert_eq!(features[1]["name"], "Gender");
    assert_eq!(features[1]["widget"]["kind"], "binary");
}

#[tokio::test]
async fn test_api_predict() {
    let (_dir, app) = test_app();
    let request = post_json(
        "/api/predict",
        serde_json::json!({"features": {"Gender": 1, "Age_at_enrollment": 19}}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["label"], "Dropout");
    assert_eq!(json["code"], 0);
    assert_eq!(json["probabilities"][0]["label"], "Dropout");
    assert!(json["prediction_id"].as_str().is_some());
    assert!(json["predicted_at"].as_str().is_some());
}

#[tokio::test]
async fn test_api_predict_missing_feature_is_unprocessable() {
    let (_dir, app) = test_app();
    let request = post_json(
        "/api/predict",
        serde_json::json!({"features": {"Age_at_enrollment": 19}}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["error"], true);
    assert_eq!(json["message"], "Schema mismatch: missing feature(s) Gender");
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, app) = test_app();
    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["artifacts"], "loaded");
    assert_eq!(json["features"], 2);
}

#[tokio::test]
async fn test_missing_artifact_halts_pages() {
    let (_dir, app) = unavailable_app();

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let html = body_string(response).await;
    assert!(html.contains("Failed to load model/data files: File not found:"));
    assert!(html.contains("encoder.json"));
    assert!(!html.contains("<form"));

    let response = app.clone().oneshot(post_form("Gender=1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app.clone().oneshot(get("/api/schema")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["artifacts"], "unavailable");
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let (_dir, app) = test_app();
    let response = app.oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
