//! Detection output: row type, CSV writer and reader, progress reporting.

mod csv;
pub mod events;
pub mod progress;
mod reader;
mod types;
mod writer;

pub use csv::{CsvWriter, write_detection_file};
pub use events::{LogLevel, ProgressEvent, ProgressSender, spawn_console_consumer};
pub use reader::{parse_confidence, read_detection_file};
pub use types::Detection;
pub use writer::OutputWriter;
