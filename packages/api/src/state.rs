use std::sync::Arc;

use leafscan::ImageClassifier;

/// Shared request-handler state.
///
/// The classifier is constructed once at startup and injected here; request
/// handlers never reach for globals. `None` means no model is available:
/// `/health` reports it and `/predict` fails per request.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Option<Arc<dyn ImageClassifier>>,
    pub plant_common_name: String,
    pub plant_scientific_name: String,
}

impl AppState {
    pub fn new(
        classifier: Option<Arc<dyn ImageClassifier>>,
        plant_common_name: impl Into<String>,
        plant_scientific_name: impl Into<String>,
    ) -> Self {
        Self {
            classifier,
            plant_common_name: plant_common_name.into(),
            plant_scientific_name: plant_scientific_name.into(),
        }
    }
}
