//! Processing pipeline components.

pub mod cancel;
mod discovery;
mod orchestrator;
mod pool;
mod processor;
mod resume;

pub use cancel::CancellationToken;
pub use discovery::{discover_directories, is_wav_file, list_recordings};
pub use orchestrator::{BatchOptions, Orchestrator, RunSummary, batch_output_name};
pub use pool::WorkerPool;
pub use processor::{FileOutcome, MergeOptions, ProcessOptions, process_file};
pub use resume::ResumeLog;
