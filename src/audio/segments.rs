//! Segment scheduling with overlap support.

use crate::audio::loader::Recording;
use crate::error::{Error, Result};
use crate::pipeline::cancel::CancellationToken;

/// A window into a recording with its absolute time bounds.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    /// 1-based position in the recording.
    pub index: usize,
    /// First sample (inclusive).
    pub start_sample: usize,
    /// Last sample (exclusive), never past the end of the recording.
    pub end_sample: usize,
    /// Start time in milliseconds.
    pub start_ms: u64,
    /// End time in milliseconds, clamped to the recording duration.
    pub end_ms: u64,
    /// Samples covered by the segment.
    pub samples: &'a [f32],
}

/// Check that a segment duration and overlap make forward progress.
pub fn validate_segmentation(segment_duration: f64, overlap: f64) -> Result<()> {
    let invalid = || Error::InvalidSegmentation {
        segment_duration,
        overlap,
    };

    if !(segment_duration.is_finite() && segment_duration > 0.0) {
        return Err(invalid());
    }
    if !(overlap.is_finite() && overlap >= 0.0 && overlap < segment_duration) {
        return Err(invalid());
    }
    Ok(())
}

/// Segment layout of one recording.
///
/// Iterating the plan is cheap and may be repeated.
#[derive(Debug, Clone)]
pub struct SegmentPlan<'a> {
    recording: &'a Recording,
    segment_duration: f64,
    segment_samples: usize,
    step: usize,
}

impl<'a> SegmentPlan<'a> {
    /// Lay out segments of `segment_duration` seconds overlapping by `overlap` seconds.
    pub fn new(recording: &'a Recording, segment_duration: f64, overlap: f64) -> Result<Self> {
        validate_segmentation(segment_duration, overlap)?;

        let rate = f64::from(recording.sample_rate());
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let segment_samples = (segment_duration * rate).round() as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let overlap_samples = (overlap * rate).round() as usize;

        if segment_samples <= overlap_samples {
            return Err(Error::InvalidSegmentation {
                segment_duration,
                overlap,
            });
        }

        Ok(Self {
            recording,
            segment_duration,
            segment_samples,
            step: segment_samples - overlap_samples,
        })
    }

    /// Samples per full segment.
    pub fn segment_samples(&self) -> usize {
        self.segment_samples
    }

    /// Samples between consecutive segment starts.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Number of segments the plan yields when not cancelled.
    pub fn segment_count(&self) -> usize {
        let total = self.recording.len();
        if total <= self.segment_samples {
            1
        } else {
            1 + (total - self.segment_samples).div_ceil(self.step)
        }
    }

    /// Iterate segments in order, stopping early once `cancel` is set.
    pub fn segments<'t>(&self, cancel: &'t CancellationToken) -> Segments<'a, 't> {
        Segments {
            plan: self.clone(),
            cancel,
            next_start: Some(0),
            index: 0,
        }
    }

    fn segment_at(&self, start: usize, index: usize) -> Segment<'a> {
        let total = self.recording.len();
        let end = (start + self.segment_samples).min(total);
        let rate = u64::from(self.recording.sample_rate());

        let start_ms = start as u64 * 1000 / rate;
        #[allow(clippy::cast_precision_loss)]
        let nominal_end_s = start as f64 / rate as f64 + self.segment_duration;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let nominal_end_ms = (nominal_end_s * 1000.0).floor() as u64;

        Segment {
            index,
            start_sample: start,
            end_sample: end,
            start_ms,
            end_ms: nominal_end_ms.min(self.recording.duration_ms()),
            samples: &self.recording.samples()[start..end],
        }
    }
}

/// Iterator over the segments of a [`SegmentPlan`].
#[derive(Debug)]
pub struct Segments<'a, 't> {
    plan: SegmentPlan<'a>,
    cancel: &'t CancellationToken,
    next_start: Option<usize>,
    index: usize,
}

impl<'a> Iterator for Segments<'a, '_> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start?;
        if self.cancel.is_cancelled() {
            self.next_start = None;
            return None;
        }

        self.index += 1;
        let segment = self.plan.segment_at(start, self.index);
        self.next_start =
            (segment.end_sample < self.plan.recording.len()).then_some(start + self.plan.step);
        Some(segment)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn silent(sample_rate: u32, len: usize) -> Recording {
        Recording::new(sample_rate, vec![0.0; len]).unwrap()
    }

    #[test]
    fn test_two_seconds_without_overlap() {
        let recording = silent(48_000, 96_000);
        let plan = SegmentPlan::new(&recording, 1.0, 0.0).unwrap();
        let token = CancellationToken::new();
        let segments: Vec<_> = plan.segments(&token).collect();

        assert_eq!(segments.len(), 2);
        assert_eq!((segments[0].start_ms, segments[0].end_ms), (0, 1000));
        assert_eq!((segments[1].start_ms, segments[1].end_ms), (1000, 2000));
        assert_eq!(segments[1].end_sample, 96_000);
        assert_eq!(segments[0].index, 1);
        assert_eq!(segments[1].index, 2);
        assert_eq!(plan.segment_count(), 2);
    }

    #[test]
    fn test_overlapping_segments() {
        // 3 s at 48 kHz, 1 s segments, 0.5 s overlap: starts at 0, 0.5, ..., 2.0
        let recording = silent(48_000, 144_000);
        let plan = SegmentPlan::new(&recording, 1.0, 0.5).unwrap();
        let token = CancellationToken::new();
        let starts: Vec<u64> = plan.segments(&token).map(|s| s.start_ms).collect();

        assert_eq!(starts, vec![0, 500, 1000, 1500, 2000]);
        assert_eq!(plan.segment_count(), 5);
    }

    #[test]
    fn test_final_segment_is_clamped() {
        let recording = silent(48_000, 60_000); // 1.25 s
        let plan = SegmentPlan::new(&recording, 1.0, 0.3).unwrap();
        let token = CancellationToken::new();
        let segments: Vec<_> = plan.segments(&token).collect();

        let last = segments.last().unwrap();
        assert_eq!(last.end_sample, 60_000);
        assert_eq!(last.end_ms, recording.duration_ms());
        assert_eq!(last.samples.len(), last.end_sample - last.start_sample);
        assert!(segments.iter().all(|s| s.end_ms <= recording.duration_ms()));
        assert_eq!(segments.len(), plan.segment_count());
    }

    #[test]
    fn test_short_recording_yields_one_segment() {
        let recording = silent(192_000, 1000);
        let plan = SegmentPlan::new(&recording, 1.0, 0.3).unwrap();
        let token = CancellationToken::new();
        let segments: Vec<_> = plan.segments(&token).collect();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].end_ms, 5);
    }

    #[test]
    fn test_count_matches_iteration() {
        let token = CancellationToken::new();
        for len in [47_999, 48_000, 48_001, 100_000, 250_000, 480_000] {
            let recording = silent(48_000, len);
            let plan = SegmentPlan::new(&recording, 1.0, 0.3).unwrap();
            assert_eq!(plan.segments(&token).count(), plan.segment_count(), "len {len}");
        }
    }

    #[test]
    fn test_plan_is_restartable() {
        let recording = silent(48_000, 200_000);
        let plan = SegmentPlan::new(&recording, 1.0, 0.3).unwrap();
        let token = CancellationToken::new();

        let first: Vec<u64> = plan.segments(&token).map(|s| s.start_ms).collect();
        let second: Vec<u64> = plan.segments(&token).map(|s| s.start_ms).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cancellation_stops_iteration() {
        let recording = silent(48_000, 480_000);
        let plan = SegmentPlan::new(&recording, 1.0, 0.0).unwrap();
        let token = CancellationToken::new();

        let mut segments = plan.segments(&token);
        assert!(segments.next().is_some());
        token.cancel();
        assert!(segments.next().is_none());
        assert!(segments.next().is_none());
    }

    #[test]
    fn test_invalid_segmentation_is_rejected() {
        let recording = silent(48_000, 96_000);
        assert!(matches!(
            SegmentPlan::new(&recording, 1.0, 1.0),
            Err(Error::InvalidSegmentation { .. })
        ));
        assert!(SegmentPlan::new(&recording, 1.0, -0.1).is_err());
        assert!(SegmentPlan::new(&recording, 0.0, 0.0).is_err());
        assert!(validate_segmentation(1.0, 0.3).is_ok());
    }
}
