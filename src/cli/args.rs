//! CLI argument definitions.

use crate::cli::validators::{
    parse_non_negative_f32, parse_non_negative_f64, parse_positive_f64, parse_positive_usize,
};
use crate::config::Config;
use crate::spectrogram::ColourScale;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Bat call detection on ultrasonic recordings.
#[derive(Debug, Parser)]
#[command(name = "batcallr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Directories of wave files to analyse.
    pub inputs: Vec<PathBuf>,

    /// Options for analysis.
    #[command(flatten)]
    pub analyze: AnalyzeArgs,

    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = "BATCALLR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only print warnings and errors; hides progress bars.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge overlapping detections in an existing output file.
    Tidy(TidyArgs),
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for the tidy command.
#[derive(Debug, Args)]
pub struct TidyArgs {
    /// Detection CSV to tidy.
    pub csv: PathBuf,

    /// Start/end tolerance in milliseconds.
    #[arg(short, long, value_parser = clap::value_parser!(i64).range(0..))]
    pub threshold: Option<i64>,

    /// Output path (default: `<input stem>_tidy.csv` next to the input).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Category to drop (default: Other).
    #[arg(long)]
    pub ignore_category: Option<String>,
}

/// Arguments for the analyze command.
#[derive(Debug, Default, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct AnalyzeArgs {
    /// Path to ONNX model file (overrides config).
    #[arg(short, long, env = "BATCALLR_MODEL")]
    pub model: Option<PathBuf>,

    /// Path to labels file (overrides config).
    #[arg(long, env = "BATCALLR_LABELS")]
    pub labels: Option<PathBuf>,

    /// Directory holding the resume log; enables resuming.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Analyse every directory below the inputs that contains wave files.
    #[arg(short, long)]
    pub recursive: bool,

    /// Number of worker threads (default: all cores).
    #[arg(short = 'j', long, value_parser = parse_positive_usize)]
    pub workers: Option<usize>,

    /// Recordings per output file.
    #[arg(long, value_parser = parse_positive_usize)]
    pub files_per_batch: Option<usize>,

    /// Segment overlap in seconds.
    #[arg(long, value_parser = parse_non_negative_f64)]
    pub overlap: Option<f64>,

    /// Segment duration in seconds.
    #[arg(long, value_parser = parse_positive_f64)]
    pub segment_duration: Option<f64>,

    /// Spectrogram colour scale (jet, gray, hot).
    #[arg(long)]
    pub colour_scale: Option<ColourScale>,

    /// Spectral subtraction weight; 0 disables noise suppression.
    #[arg(long, value_parser = parse_non_negative_f32)]
    pub noise_weight: Option<f32>,

    /// Do not draw frequency gridlines.
    #[arg(long)]
    pub no_gridlines: bool,

    /// Output file prefix (default: output).
    #[arg(short, long)]
    pub output_name: Option<String>,

    /// Keep overlapping detections instead of merging them.
    #[arg(long)]
    pub no_merge: bool,

    /// Start/end tolerance for merging, in milliseconds.
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..))]
    pub merge_threshold: Option<i64>,

    /// Save rendered spectrograms as PNG in an `img` directory.
    #[arg(long)]
    pub save_images: bool,

    /// Write a UTF-8 BOM at the start of CSV files.
    #[arg(long)]
    pub csv_bom: bool,

    /// Disable progress bars.
    #[arg(long)]
    pub no_progress: bool,
}

impl AnalyzeArgs {
    /// Overlay command-line values on a configuration.
    pub fn apply_to(&self, config: &mut Config) {
        let model = &mut config.model;
        if let Some(path) = &self.model {
            model.path = Some(path.clone());
        }
        if let Some(labels) = &self.labels {
            model.labels = Some(labels.clone());
        }

        let defaults = &mut config.defaults;
        defaults.recursive |= self.recursive;
        defaults.save_images |= self.save_images;
        defaults.csv_bom |= self.csv_bom;
        if self.no_gridlines {
            defaults.gridlines = false;
        }
        if self.no_merge {
            defaults.merge_overlaps = false;
        }
        if let Some(workers) = self.workers {
            defaults.workers = Some(workers);
        }
        if let Some(files) = self.files_per_batch {
            defaults.files_per_batch = files;
        }
        if let Some(overlap) = self.overlap {
            defaults.overlap = overlap;
        }
        if let Some(duration) = self.segment_duration {
            defaults.segment_duration = duration;
        }
        if let Some(scale) = self.colour_scale {
            defaults.colour_scale = scale;
        }
        if let Some(weight) = self.noise_weight {
            defaults.noise_weight = weight;
        }
        if let Some(name) = &self.output_name {
            defaults.output_name = Some(name.clone());
        }
        if let Some(threshold) = self.merge_threshold {
            defaults.merge_threshold_ms = threshold;
        }
    }
}
