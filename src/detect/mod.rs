//! Call detection: the detector interface, the ONNX backend and the mapping
//! from image boxes to detection rows.

pub mod labels;
pub mod letterbox;
pub mod mapper;
pub mod nms;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod yolo;

use crate::error::Result;
use crate::spectrogram::SpectrogramImage;

pub use mapper::map_detections;
#[cfg(feature = "onnx")]
pub use onnx::OnnxDetector;

/// A box predicted by the model, in pixels of the image it was given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxPrediction {
    /// Left edge.
    pub x_min: f32,
    /// Top edge.
    pub y_min: f32,
    /// Right edge.
    pub x_max: f32,
    /// Bottom edge.
    pub y_max: f32,
    /// Index into [`Detector::class_names`].
    pub class_id: usize,
    /// Confidence score.
    pub confidence: f32,
}

impl BoxPrediction {
    /// Box area, zero for degenerate boxes.
    pub fn area(&self) -> f32 {
        (self.x_max - self.x_min).max(0.0) * (self.y_max - self.y_min).max(0.0)
    }
}

/// Object detector over spectrogram images.
///
/// Implementations are shared immutably between worker threads.
pub trait Detector: Send + Sync {
    /// Class names, indexed by [`BoxPrediction::class_id`].
    fn class_names(&self) -> &[String];

    /// Detect boxes in every image. Returns one list per input image, in order.
    fn detect_batch(&self, images: &[SpectrogramImage]) -> Result<Vec<Vec<BoxPrediction>>>;
}
