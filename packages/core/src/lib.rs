//! Image classification core for the Leafscan inference service.
//!
//! Loads a TFLite classifier once, preprocesses incoming images into the
//! model's input tensor and ranks the output probabilities against an
//! ordered label list. The HTTP layer consumes this through the
//! [`ImageClassifier`] trait so request handling never touches global state.

pub mod classifier;
pub mod error;
pub mod labels;
pub mod ranking;

pub use classifier::{ImageClassifier, TfliteClassifier};
pub use error::{ClassifierError, ClassifierResult};
pub use labels::Labels;
pub use ranking::{Prediction, rank};
