//! Batch orchestration across directories.
//!
//! Each pending directory is processed in batches of recordings. A batch's
//! detections are written to one CSV only after every recording in it has
//! finished, and a directory is marked done in the resume log only after all
//! of its batches are written.

use crate::audio::validate_segmentation;
use crate::constants::PROGRESS_REPORT_INTERVAL;
use crate::constants::output::DEFAULT_PREFIX;
use crate::detect::Detector;
use crate::error::{Error, Result};
use crate::output::{Detection, LogLevel, ProgressEvent, ProgressSender, write_detection_file};
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::discovery::list_recordings;
use crate::pipeline::pool::WorkerPool;
use crate::pipeline::processor::{FileOutcome, ProcessOptions, process_file};
use crate::pipeline::resume::ResumeLog;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

/// Settings for a whole analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    /// Recordings per output file.
    pub files_per_batch: usize,
    /// Output file prefix; `None` uses `output`.
    pub output_name: Option<String>,
    /// Write a UTF-8 BOM at the start of output files.
    pub csv_bom: bool,
    /// Directory holding the resume log; `None` disables resuming.
    pub log_dir: Option<PathBuf>,
    /// Per-recording settings.
    pub process: ProcessOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            files_per_batch: crate::constants::DEFAULT_FILES_PER_BATCH,
            output_name: None,
            csv_bom: false,
            log_dir: None,
            process: ProcessOptions::default(),
        }
    }
}

/// Totals for a finished or cancelled run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Directories fully analysed.
    pub directories: usize,
    /// Recordings processed, including rejected ones.
    pub files: usize,
    /// Detection rows written.
    pub detections: usize,
    /// Output files written, in order.
    pub outputs: Vec<PathBuf>,
    /// The run stopped early because of cancellation.
    pub cancelled: bool,
}

/// Output file name for a batch of recordings `first..=last` (1-based).
pub fn batch_output_name(prefix: Option<&str>, first: usize, last: usize) -> String {
    format!("{}_{first}-{last}.csv", prefix.unwrap_or(DEFAULT_PREFIX))
}

/// Drives discovery results through the worker pool and writes output.
pub struct Orchestrator<'a> {
    detector: &'a dyn Detector,
    pool: WorkerPool,
    options: BatchOptions,
    progress: ProgressSender,
    cancel: CancellationToken,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator.
    pub fn new(
        detector: &'a dyn Detector,
        pool: WorkerPool,
        options: BatchOptions,
        progress: ProgressSender,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            detector,
            pool,
            options,
            progress,
            cancel,
        }
    }

    /// Analyse every pending directory in `dirs`.
    ///
    /// Configuration and resume log problems are reported before any
    /// recording is read. A detector failure cancels the remaining work and
    /// is returned without writing the current batch.
    pub fn run(&self, dirs: &[PathBuf]) -> Result<RunSummary> {
        let process = &self.options.process;
        validate_segmentation(process.segment_duration(), process.overlap)?;
        if self.options.files_per_batch == 0 {
            return Err(Error::ConfigValidation {
                message: "files_per_batch must be at least 1".to_string(),
            });
        }

        let mut summary = RunSummary::default();
        if dirs.is_empty() {
            self.progress.log(LogLevel::Warn, "No folders with wav-files found");
            return Ok(summary);
        }

        let mut resume_log = match &self.options.log_dir {
            Some(log_dir) => Some(ResumeLog::open_or_create(log_dir, dirs)?),
            None => None,
        };
        let pending = resume_log
            .as_ref()
            .map_or_else(|| dirs.to_vec(), ResumeLog::pending);

        if pending.is_empty() {
            self.progress
                .status("All folders are already analysed; nothing to do");
            return Ok(summary);
        }
        self.progress.status(format!(
            "Starting analysis of {} folder(s) with {} worker(s)",
            pending.len(),
            self.pool.workers()
        ));

        for (position, dir) in pending.iter().enumerate() {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            self.progress.send(ProgressEvent::CurrentDirectory {
                path: dir.clone(),
                position: position + 1,
                total: pending.len(),
            });

            if !self.analyse_directory(dir, &mut summary)? {
                summary.cancelled = true;
                break;
            }

            if let Some(log) = resume_log.as_mut() {
                log.mark_done(dir)?;
            }
            summary.directories += 1;
        }

        if summary.cancelled {
            self.progress.log(
                LogLevel::Warn,
                "Analysis cancelled; the current batch was not written",
            );
        } else {
            self.progress.status(format!(
                "All folders are analysed: {} recordings, {} detections",
                summary.files, summary.detections
            ));
        }
        Ok(summary)
    }

    /// Returns `false` when cancellation stopped the directory early.
    fn analyse_directory(&self, dir: &Path, summary: &mut RunSummary) -> Result<bool> {
        let started = Instant::now();
        let files = list_recordings(dir)?;
        if files.is_empty() {
            self.progress.log(
                LogLevel::Warn,
                format!("No wav-files found in {}", dir.display()),
            );
            return Ok(true);
        }
        self.progress.status(format!(
            "Analysing {} wav-files in {}",
            files.len(),
            dir.display()
        ));

        for (batch, chunk) in files.chunks(self.options.files_per_batch).enumerate() {
            let first = batch * self.options.files_per_batch + 1;
            let last = first + chunk.len() - 1;
            self.progress
                .status(format!("Analysing files {first} - {last}..."));

            let Some(detections) = self.analyse_batch(chunk)? else {
                return Ok(false);
            };

            let name = batch_output_name(self.options.output_name.as_deref(), first, last);
            let path = dir.join(name);
            write_detection_file(&path, &detections, self.options.csv_bom)?;

            summary.files += chunk.len();
            summary.detections += detections.len();
            self.progress.log(
                LogLevel::Info,
                format!(
                    "Files {first} - {last}: {} detections stored in {}",
                    detections.len(),
                    path.display()
                ),
            );
            summary.outputs.push(path);
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.progress.log(
            LogLevel::Info,
            format!(
                "[{timestamp}] Finished {} in {:.1}s",
                dir.display(),
                started.elapsed().as_secs_f64()
            ),
        );
        Ok(true)
    }

    /// Process one batch on the pool. Returns `None` if cancelled.
    fn analyse_batch(&self, files: &[PathBuf]) -> Result<Option<Vec<Detection>>> {
        let total = files.len();
        let mut outcomes: Vec<Option<FileOutcome>> = vec![None; total];
        let mut first_error: Option<Error> = None;
        let mut completed = 0;

        self.progress
            .send(ProgressEvent::BatchProgress { completed, total });

        self.pool.run(
            files.iter().collect(),
            &self.cancel,
            |path: &PathBuf| process_file(path, self.detector, &self.options.process, &self.cancel),
            |index, result| {
                completed += 1;
                match result {
                    Ok(outcome) => outcomes[index] = Some(outcome),
                    Err(e) => {
                        if first_error.is_none() {
                            self.cancel.cancel();
                            first_error = Some(e);
                        }
                    }
                }
                if completed % PROGRESS_REPORT_INTERVAL == 0 || completed == total {
                    self.progress
                        .send(ProgressEvent::BatchProgress { completed, total });
                }
            },
        );

        if let Some(e) = first_error {
            self.progress
                .log(LogLevel::Error, format!("Analysis stopped: {e}"));
            return Err(e);
        }

        let cancelled = self.cancel.is_cancelled()
            || outcomes
                .iter()
                .any(|o| matches!(o, None | Some(FileOutcome::Cancelled)));
        if cancelled {
            debug!("Batch cancelled after {completed} of {total} recordings");
            return Ok(None);
        }

        let rejected = outcomes
            .iter()
            .filter(|o| matches!(o, Some(FileOutcome::NoData)))
            .count();
        if rejected > 0 {
            self.progress.log(
                LogLevel::Warn,
                format!("{rejected} recording(s) could not be analysed; see the corruption log"),
            );
        }

        Ok(Some(
            outcomes
                .into_iter()
                .flatten()
                .flat_map(FileOutcome::into_detections)
                .collect(),
        ))
    }
}
