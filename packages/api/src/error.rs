use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use leafscan::ClassifierError;
use serde::Serialize;

/// Request-boundary error.
///
/// Every handler failure converts into this and is serialized as the wire
/// contract's `{"error": <message>}` body; nothing propagates far enough to
/// take the process down.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Bad request: {}", msg);
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Internal error: {}", msg);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
        }

        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        // Decode and inference failures are both surfaced as 500 with the
        // underlying message, matching the reference contract.
        Self::internal(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}
