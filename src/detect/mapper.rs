//! Mapping of image boxes to time and frequency detections.

use crate::constants::spectrogram::MAX_FREQUENCY_HZ;
use crate::detect::{BoxPrediction, Detector};
use crate::error::{Error, Result};
use crate::output::Detection;
use crate::spectrogram::SpectrogramImage;
use std::path::Path;
use tracing::debug;

/// Run the detector over every image of one recording and convert the boxes
/// to detection rows.
///
/// `segment_duration` is the nominal segment length in seconds; the image
/// width always spans that duration, even for a short final segment.
pub fn map_detections(
    detector: &dyn Detector,
    images: &[SpectrogramImage],
    wav_path: &Path,
    segment_duration: f64,
) -> Result<Vec<Detection>> {
    if images.is_empty() {
        return Ok(Vec::new());
    }

    let predictions = detector.detect_batch(images)?;
    if predictions.len() != images.len() {
        return Err(Error::Inference {
            reason: format!(
                "detector returned {} results for {} images",
                predictions.len(),
                images.len()
            ),
        });
    }

    let span_ms = segment_duration * 1000.0;
    let class_names = detector.class_names();
    let mut detections = Vec::new();

    for (image, boxes) in images.iter().zip(predictions) {
        for prediction in boxes {
            let category = class_names
                .get(prediction.class_id)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", prediction.class_id));
            let mut detection =
                Detection::for_recording(wav_path, category, prediction.confidence);
            apply_bounds(&mut detection, &prediction, image, span_ms);
            detections.push(detection);
        }
    }

    debug!(
        "{}: {} detections from {} segments",
        wav_path.display(),
        detections.len(),
        images.len()
    );
    Ok(detections)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn apply_bounds(
    detection: &mut Detection,
    prediction: &BoxPrediction,
    image: &SpectrogramImage,
    span_ms: f64,
) {
    let width = f64::from(image.width());
    let height = f64::from(image.height());
    let base_ms = image.start_ms as f64;

    let time = |x: f32| (f64::from(x) / width).mul_add(span_ms, base_ms).round_ties_even() as i64;
    let freq = |y: f32| ((height - f64::from(y)) * MAX_FREQUENCY_HZ / height).round_ties_even() as i64;

    detection.start_time_ms = time(prediction.x_min);
    detection.end_time_ms = time(prediction.x_max);
    detection.freq_min = freq(prediction.y_max);
    detection.freq_max = freq(prediction.y_min);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    struct FixedDetector {
        classes: Vec<String>,
        boxes: Vec<BoxPrediction>,
    }

    impl Detector for FixedDetector {
        fn class_names(&self) -> &[String] {
            &self.classes
        }

        fn detect_batch(&self, images: &[SpectrogramImage]) -> Result<Vec<Vec<BoxPrediction>>> {
            Ok(images.iter().map(|_| self.boxes.clone()).collect())
        }
    }

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn class_names(&self) -> &[String] {
            &[]
        }

        fn detect_batch(&self, _images: &[SpectrogramImage]) -> Result<Vec<Vec<BoxPrediction>>> {
            Err(Error::Inference {
                reason: "out of memory".to_string(),
            })
        }
    }

    fn image(index: usize, start_ms: u64) -> SpectrogramImage {
        SpectrogramImage {
            image: DynamicImage::ImageRgb8(RgbImage::new(1280, 400)),
            index,
            start_ms,
            end_ms: start_ms + 1000,
        }
    }

    fn full_box(class_id: usize) -> BoxPrediction {
        BoxPrediction {
            x_min: 0.0,
            y_min: 0.0,
            x_max: 1280.0,
            y_max: 400.0,
            class_id,
            confidence: 0.8,
        }
    }

    #[test]
    fn test_full_extent_box_covers_segment() {
        let detector = FixedDetector {
            classes: vec!["Buzz".to_string()],
            boxes: vec![full_box(0)],
        };
        let images = [image(1, 0), image(2, 700)];
        let rows = map_detections(&detector, &images, Path::new("site/a.wav"), 1.0).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].start_time_ms, rows[0].end_time_ms), (0, 1000));
        assert_eq!((rows[1].start_time_ms, rows[1].end_time_ms), (700, 1700));
        assert_eq!((rows[0].freq_min, rows[0].freq_max), (0, 120_000));
        assert_eq!(rows[0].filename, "a.wav");
        assert_eq!(rows[0].category, "Buzz");
    }

    #[test]
    fn test_partial_box() {
        let detector = FixedDetector {
            classes: vec!["Buzz".to_string()],
            boxes: vec![BoxPrediction {
                x_min: 320.0,
                y_min: 100.0,
                x_max: 640.0,
                y_max: 300.0,
                class_id: 0,
                confidence: 0.5,
            }],
        };
        let rows = map_detections(&detector, &[image(1, 0)], Path::new("a.wav"), 1.0).unwrap();

        assert_eq!((rows[0].start_time_ms, rows[0].end_time_ms), (250, 500));
        assert_eq!((rows[0].freq_min, rows[0].freq_max), (30_000, 90_000));
    }

    #[test]
    fn test_unknown_class_gets_placeholder_name() {
        let detector = FixedDetector {
            classes: vec!["Buzz".to_string()],
            boxes: vec![full_box(3)],
        };
        let rows = map_detections(&detector, &[image(1, 0)], Path::new("a.wav"), 1.0).unwrap();
        assert_eq!(rows[0].category, "class_3");
    }

    #[test]
    fn test_no_boxes_gives_no_rows() {
        let detector = FixedDetector {
            classes: vec!["Buzz".to_string()],
            boxes: Vec::new(),
        };
        let rows = map_detections(&detector, &[image(1, 0)], Path::new("a.wav"), 1.0).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_detector_failure_propagates() {
        let result = map_detections(&FailingDetector, &[image(1, 0)], Path::new("a.wav"), 1.0);
        assert!(matches!(result, Err(Error::Inference { .. })));
    }
}
