//! Class-aware greedy non-maximum suppression.

use crate::detect::BoxPrediction;

/// Intersection over union of two boxes.
pub fn iou(a: &BoxPrediction, b: &BoxPrediction) -> f32 {
    let width = (a.x_max.min(b.x_max) - a.x_min.max(b.x_min)).max(0.0);
    let height = (a.y_max.min(b.y_max) - a.y_min.max(b.y_min)).max(0.0);
    let intersection = width * height;
    let union = a.area() + b.area() - intersection;
    if union <= 0.0 { 0.0 } else { intersection / union }
}

/// Keep the highest-confidence boxes, dropping any box that overlaps a kept
/// box of the same class by more than `iou_threshold`.
///
/// The result is sorted by descending confidence and holds at most
/// `max_boxes` entries.
pub fn non_max_suppression(
    mut boxes: Vec<BoxPrediction>,
    iou_threshold: f32,
    max_boxes: usize,
) -> Vec<BoxPrediction> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<BoxPrediction> = Vec::new();
    for candidate in boxes {
        if kept.len() >= max_boxes {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && iou(k, &candidate) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
