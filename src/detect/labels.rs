//! Class label files: one class name per line.

use crate::error::{Error, Result};
use std::path::Path;

/// Load class names, skipping blank lines.
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::LabelsFileNotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|source| Error::LabelsRead {
        path: path.to_path_buf(),
        source,
    })?;

    let labels: Vec<String> = contents
        .lines()
        .map(|line| line.trim().trim_start_matches('\u{feff}'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        return Err(Error::EmptyLabels {
            path: path.to_path_buf(),
        });
    }
    Ok(labels)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_labels() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Feeding buzz").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  Social call  ").unwrap();
        writeln!(file, "Other").unwrap();
        file.flush().unwrap();

        let labels = load_labels(file.path()).unwrap();
        assert_eq!(labels, vec!["Feeding buzz", "Social call", "Other"]);
    }

    #[test]
    fn test_empty_labels_rejected() {
        let file = NamedTempFile::new().unwrap();
        assert!(matches!(
            load_labels(file.path()),
            Err(Error::EmptyLabels { .. })
        ));
    }

    #[test]
    fn test_missing_labels_rejected() {
        assert!(matches!(
            load_labels(Path::new("/nonexistent/labels.txt")),
            Err(Error::LabelsFileNotFound { .. })
        ));
    }
}
