//! YOLO detector running an ONNX model with tract.

use crate::constants::detection::{CONFIDENCE_THRESHOLD, IOU_THRESHOLD, MAX_DETECTIONS};
use crate::detect::labels::load_labels;
use crate::detect::letterbox::Letterbox;
use crate::detect::yolo::{DecodeOptions, decode_head};
use crate::detect::{BoxPrediction, Detector};
use crate::error::{Error, Result};
use crate::spectrogram::SpectrogramImage;
use std::path::Path;
use tracing::{debug, info};
use tract_onnx::prelude::*;

/// Detector backed by a YOLOv8-style ONNX model.
///
/// The model takes a `1x3xHxW` RGB tensor scaled to `[0, 1]` and returns a
/// `1x(4+classes)xanchors` head.
pub struct OnnxDetector {
    model: TypedRunnableModel<TypedModel>,
    class_names: Vec<String>,
    input_width: u32,
    input_height: u32,
    options: DecodeOptions,
}

impl std::fmt::Debug for OnnxDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDetector")
            .field("class_names", &self.class_names)
            .field("input_width", &self.input_width)
            .field("input_height", &self.input_height)
            .finish_non_exhaustive()
    }
}

impl OnnxDetector {
    /// Load a model and its labels file.
    pub fn load(model_path: &Path, labels_path: &Path, input_size: (u32, u32)) -> Result<Self> {
        if !model_path.exists() {
            return Err(Error::ModelFileNotFound {
                path: model_path.to_path_buf(),
            });
        }
        let class_names = load_labels(labels_path)?;
        let (input_width, input_height) = input_size;

        let load_error = |e: TractError| Error::ModelLoad {
            path: model_path.to_path_buf(),
            reason: format!("{e:#}"),
        };

        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(load_error)?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_height as usize, input_width as usize),
                ),
            )
            .map_err(load_error)?
            .into_optimized()
            .map_err(load_error)?
            .into_runnable()
            .map_err(load_error)?;

        info!(
            "Loaded detection model {} ({} classes, {}x{} input)",
            model_path.display(),
            class_names.len(),
            input_width,
            input_height
        );

        Ok(Self {
            model,
            class_names,
            input_width,
            input_height,
            options: DecodeOptions {
                confidence_threshold: CONFIDENCE_THRESHOLD,
                iou_threshold: IOU_THRESHOLD,
                max_boxes: MAX_DETECTIONS,
            },
        })
    }

    fn detect_one(&self, image: &SpectrogramImage) -> Result<Vec<BoxPrediction>> {
        let letterbox = Letterbox::new(
            (image.width(), image.height()),
            (self.input_width, self.input_height),
        );
        let pixels = letterbox.apply(&image.image);

        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, self.input_height as usize, self.input_width as usize),
            |(_, channel, y, x)| {
                #[allow(clippy::cast_possible_truncation)]
                let value = pixels.get_pixel(x as u32, y as u32).0[channel];
                f32::from(value) / 255.0
            },
        )
        .into_tensor();

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| inference_error(&e))?;
        let output = outputs.first().ok_or_else(|| Error::Inference {
            reason: "model produced no outputs".to_string(),
        })?;
        let head = output
            .to_array_view::<f32>()
            .map_err(|e| inference_error(&e))?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .map_err(|e| Error::Inference {
                reason: format!("unexpected output rank: {e}"),
            })?;

        let rows = 4 + self.class_names.len();
        let shape = head.shape();
        let boxes = if shape[1] == rows {
            decode_head(
                self.class_names.len(),
                shape[2],
                |row, anchor| head[[0, row, anchor]],
                &self.options,
            )
        } else if shape[2] == rows {
            decode_head(
                self.class_names.len(),
                shape[1],
                |row, anchor| head[[0, anchor, row]],
                &self.options,
            )
        } else {
            return Err(Error::Inference {
                reason: format!(
                    "output shape {shape:?} does not match {} classes",
                    self.class_names.len()
                ),
            });
        };

        debug!("Segment {}: {} boxes", image.index, boxes.len());
        Ok(boxes.into_iter().map(|b| letterbox.unmap(b)).collect())
    }
}

fn inference_error(e: &TractError) -> Error {
    Error::Inference {
        reason: format!("{e:#}"),
    }
}

impl Detector for OnnxDetector {
    fn class_names(&self) -> &[String] {
        &self.class_names
    }

    fn detect_batch(&self, images: &[SpectrogramImage]) -> Result<Vec<Vec<BoxPrediction>>> {
        images.iter().map(|image| self.detect_one(image)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_model_is_reported() {
        let mut labels = NamedTempFile::new().unwrap();
        writeln!(labels, "Feeding buzz").unwrap();

        let result = OnnxDetector::load(
            Path::new("/nonexistent/model.onnx"),
            labels.path(),
            (640, 640),
        );
        assert!(matches!(result, Err(Error::ModelFileNotFound { .. })));
    }

    #[test]
    fn test_invalid_model_is_reported() {
        let mut model = NamedTempFile::new().unwrap();
        model.write_all(b"not an onnx model").unwrap();
        let mut labels = NamedTempFile::new().unwrap();
        writeln!(labels, "Feeding buzz").unwrap();

        let result = OnnxDetector::load(model.path(), labels.path(), (640, 640));
        assert!(matches!(result, Err(Error::ModelLoad { .. })));
    }
}
