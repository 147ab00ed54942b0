//! CSV output format writer.

use crate::constants::UTF8_BOM;
use crate::constants::output::CSV_COLUMNS;
use crate::error::{Error, Result};
use crate::output::{Detection, OutputWriter};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// CSV format output writer.
pub struct CsvWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvWriter {
    /// Create a new CSV writer, optionally starting the file with a UTF-8 BOM.
    pub fn new(path: &Path, bom: bool) -> Result<Self> {
        let io_error = |source| Error::OutputWrite {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::create(path).map_err(io_error)?;
        if bom {
            file.write_all(UTF8_BOM).map_err(io_error)?;
        }
        Ok(Self {
            writer: csv::Writer::from_writer(file),
            path: path.to_path_buf(),
        })
    }

    fn csv_error(&self, source: csv::Error) -> Error {
        Error::OutputWrite {
            path: self.path.clone(),
            source: source.into(),
        }
    }
}

impl OutputWriter for CsvWriter {
    fn write_header(&mut self) -> Result<()> {
        self.writer
            .write_record(CSV_COLUMNS)
            .map_err(|e| self.csv_error(e))
    }

    fn write_detection(&mut self, detection: &Detection) -> Result<()> {
        let confidence = detection
            .confidence
            .filter(|c| !c.is_nan())
            .map(|c| c.to_string())
            .unwrap_or_default();
        let numbers = [
            detection.start_time_ms,
            detection.end_time_ms,
            detection.freq_min,
            detection.freq_max,
        ]
        .map(|n| n.to_string());
        let text = [
            detection.filename.as_str(),
            detection.filepath.as_str(),
            detection.category.as_str(),
            confidence.as_str(),
        ];
        self.writer
            .write_record(text.into_iter().chain(numbers.iter().map(String::as_str)))
            .map_err(|e| self.csv_error(e))
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush().map_err(|source| Error::OutputWrite {
            path: self.path.clone(),
            source,
        })
    }
}

/// Write a complete detection file.
pub fn write_detection_file(path: &Path, detections: &[Detection], bom: bool) -> Result<()> {
    CsvWriter::new(path, bom)?.write_all(detections)
}
