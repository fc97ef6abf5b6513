use std::{fs, io::Cursor, path::Path};

use image::{imageops, imageops::FilterType};
use tract_tflite::prelude::*;

use crate::{
    error::{ClassifierError, ClassifierResult},
    labels::Labels,
    ranking::{self, Prediction},
};

/// A loaded image classifier.
///
/// Implementations are immutable after construction and safe to share
/// across concurrent request handlers behind an `Arc`.
pub trait ImageClassifier: Send + Sync {
    /// Decodes raw image bytes, runs inference and returns the ranked
    /// per-class predictions.
    fn predict(&self, image_bytes: &[u8]) -> ClassifierResult<Vec<Prediction>>;
}

/// Input tensor element type expected by the loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    /// f32 input, pixels scaled from [0,255] to [0.0,1.0]
    Float,
    /// u8 input, raw pixel bytes (quantized export)
    Quantized,
}

/// TFLite-backed classifier built on a tract typed plan.
///
/// The plan is optimized once at load time; `run` takes `&self`, so a
/// single handle serves all requests without locking.
pub struct TfliteClassifier {
    plan: TypedRunnableModel<TypedModel>,
    input: InputKind,
    width: u32,
    height: u32,
    labels: Labels,
}

impl TfliteClassifier {
    /// Reads the model and label files and builds the classifier.
    pub fn from_paths(
        model_path: &Path,
        labels_path: &Path,
        width: u32,
        height: u32,
    ) -> ClassifierResult<Self> {
        let raw = fs::read(model_path).map_err(|e| {
            ClassifierError::Load(format!(
                "Failed to read .tflite model '{}': {}",
                model_path.display(),
                e
            ))
        })?;
        if raw.is_empty() {
            return Err(ClassifierError::Load(format!(
                "Model file '{}' is empty",
                model_path.display()
            )));
        }
        let labels = Labels::from_file(labels_path).map_err(|e| {
            ClassifierError::Load(format!(
                "Failed to read labels file '{}': {}",
                labels_path.display(),
                e
            ))
        })?;
        Self::from_bytes(&raw, labels, width, height)
    }

    /// Builds the classifier from an in-memory model buffer.
    pub fn from_bytes(
        raw: &[u8],
        labels: Labels,
        width: u32,
        height: u32,
    ) -> ClassifierResult<Self> {
        let model_bytes = find_tflite_slice(raw)
            .ok_or_else(|| ClassifierError::Load("Could not locate TFLite buffer (TFL3 id)".into()))?;

        let mut cursor = Cursor::new(model_bytes);
        let model = tract_tflite::tflite()
            .model_for_read(&mut cursor)
            .map_err(|e| ClassifierError::Load(format!("TFLite parse error: {e}")))?;

        let inlet = model
            .input_outlets()
            .map_err(|e| ClassifierError::Load(format!("Model has no inputs: {e}")))?[0];
        let orig_dt = model
            .outlet_fact(inlet)
            .map_err(|e| ClassifierError::Load(format!("Failed to read input fact: {e}")))?
            .datum_type;

        let input_shape = tvec!(1, height as usize, width as usize, 3);
        let (input, fact) = if orig_dt == f32::datum_type() {
            (
                InputKind::Float,
                TypedFact::dt_shape(f32::datum_type(), input_shape),
            )
        } else if orig_dt == u8::datum_type() {
            (
                InputKind::Quantized,
                TypedFact::dt_shape(u8::datum_type(), input_shape),
            )
        } else {
            return Err(ClassifierError::Load(format!(
                "Unsupported input dtype: {orig_dt:?} (only F32 and U8 are supported)"
            )));
        };

        let plan = model
            .with_input_fact(0, fact)
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| ClassifierError::Load(format!("Failed to prepare model: {e}")))?;

        if let Ok(out_fact) = plan.model().output_fact(0)
            && let Some(dims) = out_fact.shape.as_concrete()
        {
            let output_width: usize = dims.iter().product();
            tracing::info!(
                input_width = width,
                input_height = height,
                input_dtype = ?orig_dt,
                output_width,
                "Model loaded"
            );
            if labels.len() != output_width {
                tracing::warn!(
                    labels = labels.len(),
                    output_width,
                    "Label count does not match model output width; extra entries will be dropped"
                );
            }
        }

        Ok(Self {
            plan,
            input,
            width,
            height,
            labels,
        })
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }
}

impl ImageClassifier for TfliteClassifier {
    fn predict(&self, image_bytes: &[u8]) -> ClassifierResult<Vec<Prediction>> {
        let decoded = image::load_from_memory(image_bytes)
            .map_err(|e| ClassifierError::Decode(e.to_string()))?;
        let rgb = decoded.to_rgb8();
        let resized = imageops::resize(&rgb, self.width, self.height, FilterType::CatmullRom);

        let (h, w) = (self.height as usize, self.width as usize);
        let tensor: Tensor = match self.input {
            InputKind::Float => {
                tract_ndarray::Array4::<f32>::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
                    resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
                })
                .into()
            }
            InputKind::Quantized => {
                tract_ndarray::Array4::<u8>::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
                    resized.get_pixel(x as u32, y as u32)[c]
                })
                .into()
            }
        };

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ClassifierError::Inference(format!("Failed to run TFLite model: {e}")))?;
        let first = outputs
            .first()
            .ok_or_else(|| ClassifierError::Inference("Model produced no outputs".into()))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("Output is not f32: {e}")))?;

        let probabilities: Vec<f32> = view.iter().copied().collect();
        Ok(ranking::rank(&probabilities, &self.labels))
    }
}

/// TFLite flatbuffers carry their file identifier at byte offset 4; scan
/// for it so containers with leading padding still load.
fn find_tflite_slice(buf: &[u8]) -> Option<&[u8]> {
    if buf.len() < 8 {
        return None;
    }
    let limit = buf.len() - 8;
    for i in 0..=limit {
        if &buf[i + 4..i + 8] == b"TFL3" {
            return Some(&buf[i..]);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_identifier_at_start() {
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(b"TFL3");
        buf.extend_from_slice(&[1, 2, 3]);
        let slice = find_tflite_slice(&buf).unwrap();
        assert_eq!(&slice[4..8], b"TFL3");
        assert_eq!(slice.len(), buf.len());
    }

    #[test]
    fn skips_leading_padding() {
        let mut buf = vec![0xFFu8; 16];
        buf.extend_from_slice(&[0, 0, 0, 0]);
        buf.extend_from_slice(b"TFL3");
        buf.extend_from_slice(&[9, 9]);
        let slice = find_tflite_slice(&buf).unwrap();
        assert_eq!(&slice[4..8], b"TFL3");
        assert_eq!(slice.len(), 10);
    }

    #[test]
    fn rejects_buffers_without_identifier() {
        assert!(find_tflite_slice(&[0u8; 64]).is_none());
    }

    #[test]
    fn rejects_short_buffers() {
        assert!(find_tflite_slice(b"TFL3").is_none());
    }

    #[test]
    fn undecodable_bytes_surface_as_load_error() {
        let err = TfliteClassifier::from_bytes(&[1, 2, 3], Labels::default(), 224, 224)
            .err()
            .unwrap();
        assert!(matches!(err, ClassifierError::Load(_)));
    }
}
