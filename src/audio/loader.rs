//! Recording loader: decode, validate, high-pass filter, normalize.
//!
//! Loading never fails hard. A recording that cannot be used is reported
//! as "no data" and an entry is appended to the corruption log in the
//! recording's directory.

use crate::audio::decode::decode_wav_file;
use crate::audio::filter::IirFilter;
use crate::constants::audio::{CORRUPTION_LOG_FILE, HIGH_PASS_CUTOFF_HZ, HIGH_PASS_ORDER};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A decoded, filtered, peak-normalized single-channel recording.
#[derive(Debug, Clone)]
pub struct Recording {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl Recording {
    /// Wrap samples at the given rate. Returns `None` for a zero sample rate.
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Option<Self> {
        (sample_rate > 0).then_some(Self {
            sample_rate,
            samples,
        })
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Sample data.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the recording holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in whole milliseconds (floored).
    pub fn duration_ms(&self) -> u64 {
        self.samples.len() as u64 * 1000 / u64::from(self.sample_rate)
    }
}

/// Why a recording could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The file could not be opened or decoded.
    Unreadable(String),
    /// The file decoded to zero samples.
    Empty,
    /// The file has more than one channel.
    MultiChannel(usize),
    /// The sample rate cannot support the high-pass cutoff.
    SampleRateTooLow(u32),
    /// The filtered signal is all zeros.
    Silent,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(reason) => write!(f, "{reason}"),
            Self::Empty => write!(f, "File does not contain audio data"),
            Self::MultiChannel(n) => write!(f, "Expected single-channel audio, found {n} channels"),
            Self::SampleRateTooLow(rate) => write!(
                f,
                "Sample rate {rate} Hz is too low for a {HIGH_PASS_CUTOFF_HZ} Hz high-pass filter"
            ),
            Self::Silent => write!(f, "File contains only silence after filtering"),
        }
    }
}

/// Load a recording, logging any rejection to the corruption log.
///
/// Returns `None` when the recording is unusable.
pub fn load_recording(path: &Path) -> Option<Recording> {
    match read_clean_recording(path) {
        Ok(recording) => Some(recording),
        Err(rejection) => {
            warn!("Skipping {}: {}", path.display(), rejection);
            if let Err(e) = append_corruption_entry(path, &rejection.to_string()) {
                warn!(
                    "Failed to update corruption log for {}: {}",
                    path.display(),
                    e
                );
            }
            None
        }
    }
}

/// Decode, validate, filter and normalize a recording without side effects.
pub fn read_clean_recording(path: &Path) -> Result<Recording, Rejection> {
    let decoded =
        decode_wav_file(path).map_err(|e| Rejection::Unreadable(describe_error(&e)))?;

    if decoded.samples.is_empty() {
        return Err(Rejection::Empty);
    }
    if decoded.channels != 1 {
        return Err(Rejection::MultiChannel(decoded.channels));
    }

    let nyquist = 0.5 * f64::from(decoded.sample_rate);
    let filter = IirFilter::butterworth_highpass(HIGH_PASS_ORDER, HIGH_PASS_CUTOFF_HZ / nyquist)
        .ok_or(Rejection::SampleRateTooLow(decoded.sample_rate))?;

    let filtered = filter.apply(&decoded.samples);
    let samples = normalize_peak(&filtered).ok_or(Rejection::Silent)?;

    debug!(
        "Loaded {} ({} samples at {} Hz)",
        path.display(),
        samples.len(),
        decoded.sample_rate
    );

    Recording::new(decoded.sample_rate, samples).ok_or(Rejection::SampleRateTooLow(0))
}

/// Scale a signal to unit peak amplitude.
///
/// Returns `None` when the peak is zero or not finite.
pub fn normalize_peak(signal: &[f64]) -> Option<Vec<f32>> {
    let peak = signal.iter().fold(0.0f64, |acc, s| acc.max(s.abs()));
    if !(peak.is_finite() && peak > 0.0) {
        return None;
    }

    #[allow(clippy::cast_possible_truncation)]
    Some(signal.iter().map(|s| (s / peak) as f32).collect())
}

/// Path of the corruption log for a recording.
pub fn corruption_log_path(recording: &Path) -> PathBuf {
    recording
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        .join(CORRUPTION_LOG_FILE)
}

/// Append `<basename>\t<reason>` to the recording directory's corruption log.
pub fn append_corruption_entry(recording: &Path, reason: &str) -> std::io::Result<()> {
    let name = recording
        .file_name()
        .map_or_else(|| recording.to_string_lossy(), |n| n.to_string_lossy());
    let reason = reason.replace(['\n', '\r', '\t'], " ");

    let mut log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(corruption_log_path(recording))?;
    writeln!(log, "{name}\t{reason}")
}

/// Flatten an error and its sources into one line.
fn describe_error(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn tone(sample_rate: u32, freq: f64, len: usize) -> Vec<i16> {
        (0..len)
            .map(|i| {
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
                let v = (2.0 * std::f64::consts::PI * freq * i as f64 / f64::from(sample_rate))
                    .sin()
                    * 10_000.0;
                #[allow(clippy::cast_possible_truncation)]
                let s = v as i16;
                s
            })
            .collect()
    }

    fn corruption_log(dir: &Path) -> String {
        std::fs::read_to_string(dir.join(CORRUPTION_LOG_FILE)).unwrap_or_default()
    }

    #[test]
    fn test_recording_duration_floors() {
        let recording = Recording::new(48_000, vec![0.0; 95_999]).unwrap();
        assert_eq!(recording.duration_ms(), 1999);
        assert!(Recording::new(0, vec![0.0]).is_none());
    }

    #[test]
    fn test_load_tone_is_normalized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 192_000, 1, &tone(192_000, 40_000.0, 19_200));

        let recording = load_recording(&path).unwrap();
        assert_eq!(recording.sample_rate(), 192_000);
        assert_eq!(recording.len(), 19_200);
        let peak = recording
            .samples()
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!((peak - 1.0).abs() < 1e-6);
        assert!(corruption_log(dir.path()).is_empty());
    }

    #[test]
    fn test_empty_file_is_logged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.wav");
        write_wav(&path, 192_000, 1, &[]);

        assert!(load_recording(&path).is_none());
        let log = corruption_log(dir.path());
        assert!(log.starts_with("empty.wav\t"));
        assert!(log.ends_with('\n'));
    }

    #[test]
    fn test_unreadable_file_is_logged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.WAV");
        std::fs::write(&path, b"RIFF????WAVEjunk").unwrap();

        assert!(load_recording(&path).is_none());
        let log = corruption_log(dir.path());
        assert!(log.starts_with("broken.WAV\t"));
        assert_eq!(log.lines().count(), 1);
    }

    #[test]
    fn test_silent_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("silent.wav");
        write_wav(&path, 192_000, 1, &[0; 1000]);

        assert_eq!(read_clean_recording(&path).unwrap_err(), Rejection::Silent);
        assert!(load_recording(&path).is_none());
        assert!(corruption_log(dir.path()).contains("silent.wav\t"));
    }

    #[test]
    fn test_multichannel_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 192_000, 2, &tone(192_000, 30_000.0, 2000));

        assert_eq!(
            read_clean_recording(&path).unwrap_err(),
            Rejection::MultiChannel(2)
        );
    }

    #[test]
    fn test_low_sample_rate_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("low.wav");
        write_wav(&path, 22_050, 1, &tone(22_050, 1000.0, 2000));

        assert_eq!(
            read_clean_recording(&path).unwrap_err(),
            Rejection::SampleRateTooLow(22_050)
        );
    }

    #[test]
    fn test_log_entries_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.wav");
        append_corruption_entry(&path, "first").unwrap();
        append_corruption_entry(&path, "second\nline").unwrap();

        assert_eq!(corruption_log(dir.path()), "a.wav\tfirst\na.wav\tsecond line\n");
    }

    #[test]
    fn test_normalize_peak() {
        let normalized = normalize_peak(&[0.5, -2.0, 1.0]).unwrap();
        assert_eq!(normalized, vec![0.25, -1.0, 0.5]);
        assert!(normalize_peak(&[0.0, 0.0]).is_none());
        assert!(normalize_peak(&[]).is_none());
    }
}
