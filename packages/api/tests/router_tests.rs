//! Integration tests for the HTTP surface.
//!
//! A stub classifier stands in for the TFLite model so the wire contract
//! can be exercised without a model artifact. The stub still decodes the
//! uploaded bytes and ranks through the real ranking code path.

use std::{io::Cursor, sync::Arc};

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use leafscan::{ClassifierError, ClassifierResult, ImageClassifier, Labels, Prediction, rank};
use leafscan_api::{construct_router, state::AppState};
use serde_json::Value;
use tower::ServiceExt;

struct StubClassifier {
    labels: Labels,
    probabilities: Vec<f32>,
}

impl StubClassifier {
    fn new(labels: &[&str], probabilities: &[f32]) -> Self {
        Self {
            labels: Labels::new(labels.iter().map(|l| l.to_string()).collect()),
            probabilities: probabilities.to_vec(),
        }
    }
}

impl ImageClassifier for StubClassifier {
    fn predict(&self, image_bytes: &[u8]) -> ClassifierResult<Vec<Prediction>> {
        image::load_from_memory(image_bytes)
            .map_err(|e| ClassifierError::Decode(e.to_string()))?;
        Ok(rank(&self.probabilities, &self.labels))
    }
}

fn state_with(classifier: Option<Arc<dyn ImageClassifier>>) -> AppState {
    AppState::new(classifier, "Apple", "Malus domestica")
}

fn apple_classifier() -> Arc<dyn ImageClassifier> {
    Arc::new(StubClassifier::new(
        &[
            "Apple Scab",
            "Apple Black Rot",
            "Apple Cedar Rust",
            "Apple Healthy",
        ],
        &[0.1, 0.6, 0.25, 0.05],
    ))
}

fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([120, 200, 90]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn multipart_request(field: &str, payload: &[u8]) -> Request<Body> {
    let boundary = "leafscan-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"leaf.png\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_missing_model() {
    let app = construct_router(state_with(None));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["model_loaded"], false);
}

#[tokio::test]
async fn health_reports_loaded_model() {
    let app = construct_router(state_with(Some(apple_classifier())));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["model_loaded"], true);
}

#[tokio::test]
async fn predict_without_image_field_is_400() {
    let app = construct_router(state_with(Some(apple_classifier())));
    let response = app
        .oneshot(multipart_request("file", &tiny_png()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No image file provided");
}

#[tokio::test]
async fn predict_rejects_undecodable_payload() {
    let app = construct_router(state_with(Some(apple_classifier())));
    let response = app
        .clone()
        .oneshot(multipart_request("image", b"definitely not an image"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(!message.is_empty());

    // The failed request must not poison subsequent handling.
    let response = app.oneshot(multipart_request("image", &tiny_png())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn predict_returns_ranked_results_with_summary() {
    let app = construct_router(state_with(Some(apple_classifier())));
    let response = app
        .oneshot(multipart_request("image", &tiny_png()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);

    let data = &json["data"];
    let results = data["results"].as_array().unwrap();
    assert_eq!(results.len(), 4);

    // Summary fields mirror the top-ranked entry.
    assert_eq!(data["disease"], results[0]["name"]);
    assert_eq!(data["confidence"], results[0]["confidence"]);
    assert_eq!(data["disease"], "Apple Black Rot");

    // Descending confidence order.
    let confidences: Vec<f64> = results
        .iter()
        .map(|r| r["confidence"].as_f64().unwrap())
        .collect();
    for pair in confidences.windows(2) {
        assert!(pair[0] >= pair[1]);
    }

    assert_eq!(data["plant_common_name"], "Apple");
    assert_eq!(data["plant_scientific_name"], "Malus domestica");

    let id = data["prediction_id"].as_str().unwrap();
    assert_eq!(id.len(), 6);
    assert!(id.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn predict_without_model_is_500() {
    let app = construct_router(state_with(None));
    let response = app
        .oneshot(multipart_request("image", &tiny_png()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Model is not loaded");
}

#[tokio::test]
async fn predict_is_deterministic_apart_from_id() {
    let app = construct_router(state_with(Some(apple_classifier())));

    let first = body_json(
        app.clone()
            .oneshot(multipart_request("image", &tiny_png()))
            .await
            .unwrap(),
    )
    .await;
    let second = body_json(
        app.oneshot(multipart_request("image", &tiny_png()))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(first["data"]["results"], second["data"]["results"]);
    assert_eq!(first["data"]["disease"], second["data"]["disease"]);
}
