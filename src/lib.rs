//! Batcallr - bat call detection on ultrasonic recordings.
//!
//! Recordings are cut into overlapping segments, rendered as spectrogram
//! images, passed through an object detector and mapped back to time and
//! frequency detections, which are then merged across segment overlaps.

#![warn(missing_docs)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod constants;
pub mod dedup;
pub mod detect;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod spectrogram;

use clap::Parser;
use cli::{AnalyzeArgs, Cli, Command, ConfigAction, TidyArgs};
use config::{Config, DefaultsConfig, ModelConfig, config_file_path, load_default_config};
use constants::output::TIDY_SUFFIX;
use detect::Detector;
use output::{ProgressSender, read_detection_file, spawn_console_consumer, write_detection_file};
use pipeline::{
    BatchOptions, CancellationToken, MergeOptions, Orchestrator, ProcessOptions, WorkerPool,
    discover_directories,
};
use spectrogram::RenderOptions;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

pub use error::{Error, Result};

/// Main entry point for the batcallr CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let config = load_default_config(cli.config.as_deref())?;

    match cli.command {
        Some(Command::Tidy(args)) => tidy(&args, &config),
        Some(Command::Config { action }) => handle_config_command(action, cli.config.as_deref()),
        None => {
            if cli.inputs.is_empty() {
                return Err(Error::ConfigValidation {
                    message: "no input directories given (see --help)".to_string(),
                });
            }
            analyze(&cli.inputs, &cli.analyze, config, cli.quiet)
        }
    }
}

/// Analyse input directories with the given options.
fn analyze(inputs: &[PathBuf], args: &AnalyzeArgs, mut config: Config, quiet: bool) -> Result<()> {
    let started = Instant::now();

    args.apply_to(&mut config);
    config::validate_config(&config)?;
    let defaults = &config.defaults;

    let dirs = discover_directories(inputs, defaults.recursive)?;
    if dirs.is_empty() {
        warn!("No folders with wav-files found");
        return Ok(());
    }
    info!("Found {} folder(s) to analyse", dirs.len());

    let detector = load_detector(&config.model)?;

    let cancel = CancellationToken::new();
    install_interrupt_handler(cancel.clone());

    let (sender, receiver) = crossbeam_channel::unbounded();
    let consumer = spawn_console_consumer(receiver, !quiet && !args.no_progress);

    let pool = defaults
        .workers
        .map_or_else(WorkerPool::with_available_parallelism, WorkerPool::new);
    let orchestrator = Orchestrator::new(
        detector.as_ref(),
        pool,
        batch_options(defaults, args.log_dir.clone()),
        ProgressSender::new(sender),
        cancel,
    );
    let result = orchestrator.run(&dirs);

    // The consumer exits once the orchestrator's sender is gone.
    drop(orchestrator);
    if consumer.join().is_err() {
        warn!("Progress display thread panicked");
    }

    let summary = result?;
    if summary.cancelled {
        warn!(
            "Cancelled after {:.1}s; rerun with the same log directory to resume",
            started.elapsed().as_secs_f64()
        );
        std::process::exit(130);
    }

    info!(
        "Complete: {} folder(s), {} recording(s), {} detection(s), {} output file(s) in {:.1}s",
        summary.directories,
        summary.files,
        summary.detections,
        summary.outputs.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

fn batch_options(defaults: &DefaultsConfig, log_dir: Option<PathBuf>) -> BatchOptions {
    BatchOptions {
        files_per_batch: defaults.files_per_batch,
        output_name: defaults.output_name.clone(),
        csv_bom: defaults.csv_bom,
        log_dir,
        process: ProcessOptions {
            overlap: defaults.overlap,
            render: RenderOptions {
                colour_scale: defaults.colour_scale,
                noise_weight: defaults.noise_weight,
                gridlines: defaults.gridlines,
                segment_duration: defaults.segment_duration,
            },
            save_images: defaults.save_images,
            merge: defaults.merge_overlaps.then(|| MergeOptions {
                threshold_ms: defaults.merge_threshold_ms,
                ignored_category: defaults.ignored_category.clone(),
            }),
        },
    }
}

#[cfg(feature = "onnx")]
fn load_detector(model: &ModelConfig) -> Result<Box<dyn Detector>> {
    let (path, labels) = config::resolve_model_files(model)?;
    info!("Loading model: {}", path.display());
    let detector =
        detect::OnnxDetector::load(&path, &labels, (model.input_width, model.input_height))?;
    Ok(Box::new(detector))
}

#[cfg(not(feature = "onnx"))]
fn load_detector(_model: &ModelConfig) -> Result<Box<dyn Detector>> {
    Err(Error::ConfigValidation {
        message: "this build has no ONNX support; rebuild with the `onnx` feature".to_string(),
    })
}

/// First Ctrl+C cancels cooperatively; a second one exits immediately.
fn install_interrupt_handler(cancel: CancellationToken) {
    if let Err(e) = ctrlc::set_handler(move || {
        if cancel.is_cancelled() {
            std::process::exit(130); // 128 + SIGINT(2)
        }
        cancel.cancel();
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }
}

/// Merge overlapping detections in an existing output file.
fn tidy(args: &TidyArgs, config: &Config) -> Result<()> {
    let detections = read_detection_file(&args.csv)?;
    let before = detections.len();

    let threshold = args
        .threshold
        .unwrap_or(config.defaults.merge_threshold_ms);
    let ignored = args
        .ignore_category
        .as_deref()
        .unwrap_or(&config.defaults.ignored_category);
    let tidied = dedup::dedup(detections, threshold, ignored);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| tidy_output_path(&args.csv));
    write_detection_file(&output, &tidied, config.defaults.csv_bom)?;

    info!(
        "Tidied {} detection(s) into {} and stored them in {}",
        before,
        tidied.len(),
        output.display()
    );
    Ok(())
}

/// Default output path for `tidy`: `<stem>_tidy.csv` next to the input.
pub fn tidy_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{stem}{TIDY_SUFFIX}.csv"))
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_str = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    fmt().with_env_filter(filter).init();
}

#[allow(clippy::print_stdout)]
fn handle_config_command(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            let (path, written) = config::save_default_config(force)?;
            if written {
                println!("Created configuration file: {}", path.display());
                println!("\nNext steps: set [model] path and labels, then run:");
                println!("  batcallr <recordings dir>");
            } else {
                println!("Configuration file already exists: {}", path.display());
                println!("Use --force to overwrite it with defaults.");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config(explicit)?;
            let contents = toml::to_string_pretty(&config)
                .map_err(|source| Error::ConfigSerialize { source })?;
            print!("{contents}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = explicit.map_or_else(config_file_path, |p| Ok(p.to_path_buf()))?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
