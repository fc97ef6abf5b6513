//! HTTP surface for the Leafscan inference service.

pub mod error;
pub mod routes;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Builds the service router with all routes attached.
pub fn construct_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::predict::routes())
        .with_state(state)
}
