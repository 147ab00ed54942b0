//! Single recording processing pipeline.

use crate::audio::{SegmentPlan, load_recording};
use crate::constants::{DEFAULT_IGNORED_CATEGORY, DEFAULT_MERGE_THRESHOLD_MS, DEFAULT_OVERLAP};
use crate::dedup::dedup;
use crate::detect::{Detector, map_detections};
use crate::error::Result;
use crate::output::Detection;
use crate::pipeline::cancel::CancellationToken;
use crate::spectrogram::{RenderOptions, SpectrogramImage};
use std::path::Path;
use tracing::{debug, info};

/// Settings for merging overlapping detections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Maximum start or end time difference for two detections to chain.
    pub threshold_ms: i64,
    /// Category dropped before merging.
    pub ignored_category: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            threshold_ms: DEFAULT_MERGE_THRESHOLD_MS,
            ignored_category: DEFAULT_IGNORED_CATEGORY.to_string(),
        }
    }
}

/// Options for processing a single recording.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
    /// Segment overlap in seconds.
    pub overlap: f64,
    /// Spectrogram rendering settings, including the segment duration.
    pub render: RenderOptions,
    /// Save every rendered segment as PNG next to the recording.
    pub save_images: bool,
    /// Merge overlapping detections; `None` keeps every row.
    pub merge: Option<MergeOptions>,
}

impl ProcessOptions {
    /// Segment duration in seconds.
    pub fn segment_duration(&self) -> f64 {
        self.render.segment_duration
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            overlap: DEFAULT_OVERLAP,
            render: RenderOptions::default(),
            save_images: false,
            merge: Some(MergeOptions::default()),
        }
    }
}

/// Result of processing one recording.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// All segments were analysed.
    Completed(Vec<Detection>),
    /// The recording was rejected by the loader.
    NoData,
    /// Cancellation was observed before the recording finished.
    Cancelled,
}

impl FileOutcome {
    /// Detections of a completed recording; empty otherwise.
    pub fn into_detections(self) -> Vec<Detection> {
        match self {
            Self::Completed(detections) => detections,
            Self::NoData | Self::Cancelled => Vec::new(),
        }
    }
}

/// Load, segment, render and detect one recording.
///
/// Unreadable recordings yield [`FileOutcome::NoData`]. Detector and
/// rendering failures are returned as errors.
pub fn process_file(
    path: &Path,
    detector: &dyn Detector,
    options: &ProcessOptions,
    cancel: &CancellationToken,
) -> Result<FileOutcome> {
    if cancel.is_cancelled() {
        return Ok(FileOutcome::Cancelled);
    }

    debug!("Processing: {}", path.display());
    let Some(recording) = load_recording(path) else {
        return Ok(FileOutcome::NoData);
    };

    let plan = SegmentPlan::new(&recording, options.segment_duration(), options.overlap)?;
    let mut images = Vec::with_capacity(plan.segment_count());
    for segment in plan.segments(cancel) {
        let image =
            SpectrogramImage::from_segment(&segment, recording.sample_rate(), &options.render)?;
        if options.save_images {
            image.save_png(path)?;
        }
        images.push(image);
    }
    if cancel.is_cancelled() {
        info!("Cancelled: {}", path.display());
        return Ok(FileOutcome::Cancelled);
    }

    let mut detections = map_detections(detector, &images, path, options.segment_duration())?;
    if cancel.is_cancelled() {
        return Ok(FileOutcome::Cancelled);
    }

    if let Some(merge) = &options.merge {
        detections = dedup(detections, merge.threshold_ms, &merge.ignored_category);
    }

    debug!(
        "{}: {} segments, {} detections",
        path.display(),
        images.len(),
        detections.len()
    );
    Ok(FileOutcome::Completed(detections))
}
