use serde::{Deserialize, Serialize};

use crate::labels::Labels;

/// A single ranked class prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub name: String,
    pub confidence: f32,
}

/// Zips a probability vector with its labels and ranks the result by
/// confidence, descending.
///
/// The zip truncates to the shorter side: probabilities beyond the label
/// list are dropped, labels beyond the output width are never referenced.
/// The sort is stable, so equal confidences keep ascending class-index
/// order and repeated calls produce identical rankings.
pub fn rank(probabilities: &[f32], labels: &Labels) -> Vec<Prediction> {
    let mut ranked: Vec<Prediction> = probabilities
        .iter()
        .zip(labels.iter())
        .map(|(confidence, name)| Prediction {
            name: name.clone(),
            confidence: *confidence,
        })
        .collect();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked
}
