//! Configuration type definitions.

use crate::constants::detection::{DEFAULT_INPUT_HEIGHT, DEFAULT_INPUT_WIDTH};
use crate::constants::{
    DEFAULT_FILES_PER_BATCH, DEFAULT_IGNORED_CATEGORY, DEFAULT_MERGE_THRESHOLD_MS,
    DEFAULT_NOISE_WEIGHT, DEFAULT_OVERLAP, DEFAULT_SEGMENT_DURATION,
};
use crate::spectrogram::ColourScale;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detection model settings.
    pub model: ModelConfig,

    /// Default analysis settings.
    pub defaults: DefaultsConfig,
}

/// Detection model settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: Option<PathBuf>,

    /// Path to the labels file, one class name per line.
    pub labels: Option<PathBuf>,

    /// Model input width in pixels.
    pub input_width: u32,

    /// Model input height in pixels.
    pub input_height: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            labels: None,
            input_width: DEFAULT_INPUT_WIDTH,
            input_height: DEFAULT_INPUT_HEIGHT,
        }
    }
}

/// Default analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Segment duration in seconds.
    pub segment_duration: f64,

    /// Segment overlap in seconds.
    pub overlap: f64,

    /// Spectrogram colour scale.
    pub colour_scale: ColourScale,

    /// Spectral subtraction weight; 0 disables noise suppression.
    pub noise_weight: f32,

    /// Draw frequency gridlines on spectrograms.
    pub gridlines: bool,

    /// Recordings per output file.
    pub files_per_batch: usize,

    /// Worker threads; unset uses every available core.
    pub workers: Option<usize>,

    /// Merge overlapping detections before writing.
    pub merge_overlaps: bool,

    /// Start/end tolerance for merging, in milliseconds.
    pub merge_threshold_ms: i64,

    /// Category dropped when merging.
    pub ignored_category: String,

    /// Output file prefix; unset writes `output_<first>-<last>.csv`.
    pub output_name: Option<String>,

    /// Write a UTF-8 BOM at the start of output CSV files.
    pub csv_bom: bool,

    /// Save rendered spectrograms as PNG.
    pub save_images: bool,

    /// Search input directories recursively.
    pub recursive: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            segment_duration: DEFAULT_SEGMENT_DURATION,
            overlap: DEFAULT_OVERLAP,
            colour_scale: ColourScale::default(),
            noise_weight: DEFAULT_NOISE_WEIGHT,
            gridlines: true,
            files_per_batch: DEFAULT_FILES_PER_BATCH,
            workers: None,
            merge_overlaps: true,
            merge_threshold_ms: DEFAULT_MERGE_THRESHOLD_MS,
            ignored_category: DEFAULT_IGNORED_CATEGORY.to_string(),
            output_name: None,
            csv_bom: false,
            save_images: false,
            recursive: false,
        }
    }
}
