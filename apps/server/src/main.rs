#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::{sync::Arc, time::Duration};

use leafscan::TfliteClassifier;
use leafscan_api::{construct_router, state::AppState};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Leafscan Inference Service");

    let config = config::Config::from_env()?;
    tracing::info!(
        model = %config.model_path.display(),
        labels = %config.labels_path.display(),
        "Loaded configuration"
    );

    // Fail fast: a service without a model is a misdeployment, so a load
    // failure is deployment-blocking rather than a per-request condition.
    let classifier = match TfliteClassifier::from_paths(
        &config.model_path,
        &config.labels_path,
        config.input_width,
        config.input_height,
    ) {
        Ok(classifier) => classifier,
        Err(err) => {
            tracing::error!("Failed to load model: {}", err);
            std::process::exit(1);
        }
    };

    let state = AppState::new(
        Some(Arc::new(classifier)),
        config.plant_common_name.clone(),
        config.plant_scientific_name.clone(),
    );

    let app = construct_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(GlobalConcurrencyLimitLayer::new(
            config.max_concurrent_requests,
        ))
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
