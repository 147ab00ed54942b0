//! Output type definitions.

use std::cmp::Ordering;
use std::path::Path;

/// A single call detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Base name of the source recording.
    pub filename: String,
    /// Path of the source recording as given to the analysis.
    pub filepath: String,
    /// Detected call category.
    pub category: String,
    /// Detection confidence (0.0 - 1.0). Absent when read back from a file
    /// whose confidence cell was empty or not a number.
    pub confidence: Option<f32>,
    /// Detection start time in milliseconds from the start of the recording.
    pub start_time_ms: i64,
    /// Detection end time in milliseconds from the start of the recording.
    pub end_time_ms: i64,
    /// Lower frequency bound in Hz.
    pub freq_min: i64,
    /// Upper frequency bound in Hz.
    pub freq_max: i64,
}

impl Detection {
    /// Create a detection for a recording at `path`.
    pub fn for_recording(path: &Path, category: impl Into<String>, confidence: f32) -> Self {
        let filename = path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        Self {
            filename,
            filepath: path.display().to_string(),
            category: category.into(),
            confidence: Some(confidence),
            start_time_ms: 0,
            end_time_ms: 0,
            freq_min: 0,
            freq_max: 0,
        }
    }

    /// Confidence for ranking; missing or NaN ranks below every real value.
    pub fn rank(&self) -> f32 {
        self.confidence
            .filter(|c| !c.is_nan())
            .unwrap_or(f32::NEG_INFINITY)
    }

    /// Order by confidence rank.
    pub fn cmp_confidence(&self, other: &Self) -> Ordering {
        self.rank().total_cmp(&other.rank())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_for_recording_splits_path() {
        let detection = Detection::for_recording(Path::new("/data/site/rec_01.wav"), "Buzz", 0.8);
        assert_eq!(detection.filename, "rec_01.wav");
        assert_eq!(detection.filepath, "/data/site/rec_01.wav");
        assert_eq!(detection.category, "Buzz");
        assert_eq!(detection.confidence, Some(0.8));
    }

    #[test]
    fn test_missing_confidence_ranks_worst() {
        let mut missing = Detection::for_recording(Path::new("a.wav"), "Buzz", 0.0);
        missing.confidence = None;
        let mut nan = missing.clone();
        nan.confidence = Some(f32::NAN);
        let low = Detection::for_recording(Path::new("a.wav"), "Buzz", 0.0);

        assert_eq!(low.cmp_confidence(&missing), Ordering::Greater);
        assert_eq!(low.cmp_confidence(&nan), Ordering::Greater);
        assert_eq!(nan.cmp_confidence(&missing), Ordering::Equal);
        assert_eq!(missing.rank(), f32::NEG_INFINITY);
    }
}
