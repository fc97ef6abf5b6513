use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use leafscan::Prediction;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}

#[derive(Serialize, Deserialize)]
pub struct PredictEnvelope {
    pub success: bool,
    pub data: PredictionResponse,
}

#[derive(Serialize, Deserialize)]
pub struct PredictionResponse {
    pub disease: String,
    pub confidence: f32,
    pub results: Vec<Prediction>,
    pub prediction_id: String,
    pub plant_common_name: String,
    pub plant_scientific_name: String,
}

/// Classifies a single uploaded image.
///
/// Accepts a multipart form with an `image` field holding the encoded
/// bytes. The summary fields duplicate the top-ranked entry of `results`.
#[tracing::instrument(name = "POST /predict", skip(state, multipart))]
pub async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PredictEnvelope>, ApiError> {
    let image = read_image_field(&mut multipart).await?;

    let classifier = state
        .classifier
        .clone()
        .ok_or_else(|| ApiError::internal("Model is not loaded"))?;

    // Inference is CPU-bound; keep it off the async workers.
    let results = tokio::task::spawn_blocking(move || classifier.predict(&image))
        .await
        .map_err(|e| ApiError::internal(format!("Inference task join error: {e}")))??;

    let top = results
        .first()
        .cloned()
        .ok_or_else(|| ApiError::internal("Classifier returned no predictions"))?;

    tracing::debug!(disease = %top.name, confidence = top.confidence, "Prediction complete");

    Ok(Json(PredictEnvelope {
        success: true,
        data: PredictionResponse {
            disease: top.name,
            confidence: top.confidence,
            results,
            prediction_id: prediction_id(),
            plant_common_name: state.plant_common_name.clone(),
            plant_scientific_name: state.plant_scientific_name.clone(),
        },
    }))
}

async fn read_image_field(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read image field: {e}")))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(ApiError::bad_request("No image file provided"))
}

/// Cosmetic 6-digit identifier; uniqueness is not guaranteed.
fn prediction_id() -> String {
    rand::rng().random_range(100_000..=999_999u32).to_string()
}

#[cfg(test)]
mod tests {
    use super::prediction_id;

    #[test]
    fn prediction_id_is_six_decimal_digits() {
        for _ in 0..100 {
            let id = prediction_id();
            assert_eq!(id.len(), 6);
            assert!(id.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
