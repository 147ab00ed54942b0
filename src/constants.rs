//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "batcallr";

/// Default segment (spectrogram) duration in seconds.
pub const DEFAULT_SEGMENT_DURATION: f64 = 1.0;

/// Default overlap between consecutive segments in seconds.
pub const DEFAULT_OVERLAP: f64 = 0.3;

/// Default number of recordings analysed before an output file is written.
pub const DEFAULT_FILES_PER_BATCH: usize = 10_000;

/// Default noise-suppression weight (0 disables spectral subtraction).
pub const DEFAULT_NOISE_WEIGHT: f32 = 0.0;

/// Default time tolerance in milliseconds for merging overlapping detections.
pub const DEFAULT_MERGE_THRESHOLD_MS: i64 = 5;

/// Category excluded from merged output.
pub const DEFAULT_IGNORED_CATEGORY: &str = "Other";

/// Audio loading and filtering constants.
pub mod audio {
    /// High-pass filter cutoff in Hz.
    pub const HIGH_PASS_CUTOFF_HZ: f64 = 15_000.0;

    /// Butterworth filter order.
    pub const HIGH_PASS_ORDER: usize = 5;

    /// Name of the per-directory log listing unreadable recordings.
    pub const CORRUPTION_LOG_FILE: &str = "corrupted_files_log.txt";

    /// Accepted recording extension (matched case-insensitively).
    pub const WAV_EXTENSION: &str = "wav";
}

/// Spectrogram rendering constants.
pub mod spectrogram {
    /// FFT size and samples per STFT frame.
    pub const FFT_SIZE: usize = 512;

    /// Hop between STFT frames (50% overlap).
    pub const HOP_SIZE: usize = FFT_SIZE / 2;

    /// Highest frequency shown on the image, in Hz.
    pub const MAX_FREQUENCY_HZ: f64 = 120_000.0;

    /// Rendered image width in pixels.
    pub const IMAGE_WIDTH: u32 = 1280;

    /// Rendered image height in pixels.
    pub const IMAGE_HEIGHT: u32 = 400;

    /// Floor added to power values before taking the logarithm.
    pub const POWER_FLOOR: f64 = 1e-10;

    /// Spacing of frequency gridlines in Hz.
    pub const GRIDLINE_SPACING_HZ: u32 = 20_000;

    /// Duration of the leading section used for the noise estimate, in seconds.
    pub const NOISE_ESTIMATE_SECS: f64 = 0.5;

    /// Directory (below the recording directory) receiving saved images.
    pub const IMAGE_DIR: &str = "img";
}

/// Detection model constants.
pub mod detection {
    /// Minimum box confidence reported by the model.
    pub const CONFIDENCE_THRESHOLD: f32 = 0.1;

    /// IoU above which overlapping boxes of one class are suppressed.
    pub const IOU_THRESHOLD: f32 = 0.4;

    /// Maximum boxes kept per image after suppression.
    pub const MAX_DETECTIONS: usize = 300;

    /// Default model input width.
    pub const DEFAULT_INPUT_WIDTH: u32 = 640;

    /// Default model input height.
    pub const DEFAULT_INPUT_HEIGHT: u32 = 640;

    /// Grey level used to pad letterboxed model input.
    pub const LETTERBOX_FILL: u8 = 114;
}

/// Output file constants.
pub mod output {
    /// Column header of detection CSV files.
    pub const CSV_COLUMNS: [&str; 8] = [
        "filename",
        "filepath",
        "category",
        "confidence",
        "start_time_ms",
        "end_time_ms",
        "freq_min",
        "freq_max",
    ];

    /// Default output file prefix.
    pub const DEFAULT_PREFIX: &str = "output";

    /// Suffix appended to tidied CSV file stems.
    pub const TIDY_SUFFIX: &str = "_tidy";
}

/// Resume log constants.
pub mod resume {
    /// Resume log file name inside the log directory.
    pub const LOG_FILE: &str = "log.csv";

    /// Directory column name.
    pub const DIR_COLUMN: &str = "dir";

    /// Completion column name.
    pub const DONE_COLUMN: &str = "done";

    /// Completed marker.
    pub const DONE: &str = "yes";

    /// Pending marker.
    pub const PENDING: &str = "no";
}

/// How often (in completed files) batch progress is reported.
pub const PROGRESS_REPORT_INTERVAL: usize = 10;

/// UTF-8 Byte Order Mark for Excel compatibility in CSV files.
pub const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";
