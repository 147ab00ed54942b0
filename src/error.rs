//! Error types for batcallr.

use std::path::PathBuf;

/// Result type alias for batcallr operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for batcallr.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize configuration")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Segment duration and overlap cannot produce forward progress.
    #[error(
        "invalid segmentation: overlap ({overlap}s) must be non-negative and shorter than the segment duration ({segment_duration}s)"
    )]
    InvalidSegmentation {
        /// Segment duration in seconds.
        segment_duration: f64,
        /// Overlap in seconds.
        overlap: f64,
    },

    /// Failed to open or probe an audio file.
    #[error("failed to open audio file '{path}'")]
    AudioOpen {
        /// Path to the audio file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to decode audio data.
    #[error("failed to decode audio file '{path}'")]
    AudioDecode {
        /// Path to the audio file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Audio file contains no audio tracks.
    #[error("no audio tracks found in '{path}'")]
    NoAudioTracks {
        /// Path to the audio file.
        path: PathBuf,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: PathBuf,
    },

    /// Labels file does not exist.
    #[error("labels file does not exist: {path}")]
    LabelsFileNotFound {
        /// Path to the missing labels file.
        path: PathBuf,
    },

    /// Failed to read labels file.
    #[error("failed to read labels file '{path}'")]
    LabelsRead {
        /// Path to the labels file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Labels file contains no class names.
    #[error("labels file '{path}' contains no class names")]
    EmptyLabels {
        /// Path to the labels file.
        path: PathBuf,
    },

    /// Detection model could not be loaded.
    #[error("failed to load detection model '{path}': {reason}")]
    ModelLoad {
        /// Path to the model file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Detection model invocation failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to read the resume log.
    #[error("failed to read resume log '{path}'")]
    ResumeLogRead {
        /// Path to the resume log.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// The resume log exists but does not have the expected structure.
    #[error("resume log '{path}' is malformed: {message}")]
    ResumeLogInvalid {
        /// Path to the resume log.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// The resume log lists different directories than were requested.
    #[error(
        "resume log '{path}' lists {logged} directories that do not match the {requested} requested; archive or rename it to start a new analysis"
    )]
    ResumeLogMismatch {
        /// Path to the resume log.
        path: PathBuf,
        /// Number of directories in the log.
        logged: usize,
        /// Number of directories requested.
        requested: usize,
    },

    /// Failed to write the resume log.
    #[error("failed to write resume log '{path}'")]
    ResumeLogWrite {
        /// Path to the resume log.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to parse a detection CSV file.
    #[error("failed to parse detection file '{path}'")]
    DetectionParseFailed {
        /// Path to the detection file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid detection file format.
    #[error("invalid detection file format: {message}")]
    InvalidDetectionFormat {
        /// Description of the format error.
        message: String,
    },

    /// Failed to save a spectrogram image.
    #[error("failed to save spectrogram image '{path}'")]
    ImageSave {
        /// Path to the image file.
        path: PathBuf,
        /// Underlying image error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to write a detection output file.
    #[error("failed to write output file '{path}'")]
    OutputWrite {
        /// Path to the output file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Internal error.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}
