//! Detection file parsing.
//!
//! Reads detection CSV files written by the analysis (or by earlier tools
//! using the same columns) back into [`Detection`] rows. Uses the `csv`
//! crate, which also skips a leading UTF-8 BOM.

use crate::error::{Error, Result};
use crate::output::Detection;
use serde::Deserialize;
use std::path::Path;

/// Internal record for CSV deserialization.
#[derive(Debug, Deserialize)]
struct DetectionRecord {
    filename: String,
    filepath: String,
    category: String,
    confidence: String,
    start_time_ms: f64,
    end_time_ms: f64,
    freq_min: f64,
    freq_max: f64,
}

/// Parse a confidence cell; empty or non-numeric cells are missing.
pub fn parse_confidence(cell: &str) -> Option<f32> {
    cell.trim().parse::<f32>().ok().filter(|c| !c.is_nan())
}

#[allow(clippy::cast_possible_truncation)]
fn whole(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Parse a detection file.
///
/// Returns `Ok(vec![])` for an empty or header-only file.
pub fn read_detection_file(path: &Path) -> Result<Vec<Detection>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| Error::DetectionParseFailed {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    let mut detections = Vec::new();

    for (line_num, result) in reader.deserialize::<DetectionRecord>().enumerate() {
        let record = result.map_err(|e| Error::InvalidDetectionFormat {
            message: format!("line {}: {e}", line_num + 2),
        })?;

        detections.push(Detection {
            filename: record.filename,
            filepath: record.filepath,
            category: record.category,
            confidence: parse_confidence(&record.confidence),
            start_time_ms: whole(record.start_time_ms),
            end_time_ms: whole(record.end_time_ms),
            freq_min: whole(record.freq_min),
            freq_max: whole(record.freq_max),
        });
    }

    Ok(detections)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::output::csv::write_detection_file;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "filename,filepath,category,confidence,start_time_ms,end_time_ms,freq_min,freq_max";

    #[test]
    fn test_parse_simple_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "a.wav,/d/a.wav,Feeding buzz,0.91,100,140,20000,60000").unwrap();
        writeln!(file, "a.wav,/d/a.wav,Social call,0.42,300,380,15000,40000").unwrap();
        file.flush().unwrap();

        let detections = read_detection_file(file.path()).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].category, "Feeding buzz");
        assert_eq!(detections[0].confidence, Some(0.91));
        assert_eq!(detections[1].end_time_ms, 380);
    }

    #[test]
    fn test_lenient_confidence() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "a.wav,/d/a.wav,Buzz,,100,140,20000,60000").unwrap();
        writeln!(file, "a.wav,/d/a.wav,Buzz,high,100,140,20000,60000").unwrap();
        writeln!(file, "a.wav,/d/a.wav,Buzz,nan,100,140,20000,60000").unwrap();
        file.flush().unwrap();

        let detections = read_detection_file(file.path()).unwrap();
        assert!(detections.iter().all(|d| d.confidence.is_none()));
    }

    #[test]
    fn test_quoted_fields_and_bom() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\xEF\xBB\xBF").unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "a.wav,\"/d/x,y/a.wav\",Buzz,0.5,1,2,3,4").unwrap();
        file.flush().unwrap();

        let detections = read_detection_file(file.path()).unwrap();
        assert_eq!(detections[0].filepath, "/d/x,y/a.wav");
    }

    #[test]
    fn test_header_only_returns_empty_vec() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        file.flush().unwrap();
        assert!(read_detection_file(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_written_file_reads_back() {
        let file = NamedTempFile::new().unwrap();
        let detection = Detection {
            start_time_ms: 5,
            end_time_ms: 50,
            freq_min: 1000,
            freq_max: 2000,
            ..Detection::for_recording(Path::new("/d/a.wav"), "Buzz", 0.75)
        };
        write_detection_file(file.path(), std::slice::from_ref(&detection), true).unwrap();
        assert_eq!(read_detection_file(file.path()).unwrap(), vec![detection]);
    }

    #[test]
    fn test_bad_time_is_reported_with_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "a.wav,/d/a.wav,Buzz,0.5,soon,2,3,4").unwrap();
        file.flush().unwrap();

        let err = read_detection_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidDetectionFormat { ref message } if message.starts_with("line 2")));
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(matches!(
            read_detection_file(Path::new("/nonexistent/output.csv")),
            Err(Error::DetectionParseFailed { .. })
        ));
    }
}
