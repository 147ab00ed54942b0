//! Decoding of YOLO-style detection heads.
//!
//! The head is a `(4 + classes) x anchors` matrix: rows 0..4 are box centre
//! x, centre y, width and height; the remaining rows are class scores.

use crate::detect::BoxPrediction;
use crate::detect::nms::non_max_suppression;

/// Thresholds applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeOptions {
    /// Minimum class score for a candidate.
    pub confidence_threshold: f32,
    /// Overlap above which same-class boxes are suppressed.
    pub iou_threshold: f32,
    /// Maximum boxes returned.
    pub max_boxes: usize,
}

/// Decode a detection head into suppressed boxes, in model input pixels.
///
/// `score` returns the value at `(row, anchor)`.
pub fn decode_head(
    classes: usize,
    anchors: usize,
    score: impl Fn(usize, usize) -> f32,
    options: &DecodeOptions,
) -> Vec<BoxPrediction> {
    let mut candidates = Vec::new();

    for anchor in 0..anchors {
        let best = (0..classes)
            .map(|class_id| (class_id, score(4 + class_id, anchor)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        let Some((class_id, confidence)) = best else {
            continue;
        };
        if confidence.is_nan() || confidence < options.confidence_threshold {
            continue;
        }

        let (cx, cy) = (score(0, anchor), score(1, anchor));
        let (w, h) = (score(2, anchor), score(3, anchor));
        candidates.push(BoxPrediction {
            x_min: cx - w / 2.0,
            y_min: cy - h / 2.0,
            x_max: cx + w / 2.0,
            y_max: cy + h / 2.0,
            class_id,
            confidence,
        });
    }

    non_max_suppression(candidates, options.iou_threshold, options.max_boxes)
}
