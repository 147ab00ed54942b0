//! Resume log: a `dir,done` CSV recording which directories are finished.

use crate::constants::resume::{DIR_COLUMN, DONE, DONE_COLUMN, LOG_FILE, PENDING};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
struct LogEntry {
    dir: String,
    done: bool,
}

/// Persisted per-directory completion state.
#[derive(Debug)]
pub struct ResumeLog {
    path: PathBuf,
    entries: Vec<LogEntry>,
}

impl ResumeLog {
    /// Open the log in `log_dir`, or create it with every directory pending.
    ///
    /// An existing log must list exactly the requested directories.
    pub fn open_or_create(log_dir: &Path, dirs: &[PathBuf]) -> Result<Self> {
        let path = log_dir.join(LOG_FILE);
        let mut requested: Vec<String> = dirs.iter().map(|d| d.display().to_string()).collect();
        requested.sort();

        if path.exists() {
            let entries = read_entries(&path)?;
            let mut logged: Vec<String> = entries.iter().map(|e| e.dir.clone()).collect();
            logged.sort();
            if logged != requested {
                return Err(Error::ResumeLogMismatch {
                    path,
                    logged: logged.len(),
                    requested: requested.len(),
                });
            }
            let log = Self { path, entries };
            info!(
                "Resuming from {}: {} of {} directories done",
                log.path.display(),
                log.entries.iter().filter(|e| e.done).count(),
                log.entries.len()
            );
            return Ok(log);
        }

        std::fs::create_dir_all(log_dir).map_err(|source| Error::OutputDirCreateFailed {
            path: log_dir.to_path_buf(),
            source,
        })?;
        let log = Self {
            path,
            entries: requested
                .into_iter()
                .map(|dir| LogEntry { dir, done: false })
                .collect(),
        };
        log.save()?;
        info!("Created resume log {}", log.path.display());
        Ok(log)
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directories not yet marked done, in log order.
    pub fn pending(&self) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter(|e| !e.done)
            .map(|e| PathBuf::from(&e.dir))
            .collect()
    }

    /// Mark a directory done and rewrite the log.
    pub fn mark_done(&mut self, dir: &Path) -> Result<()> {
        let key = dir.display().to_string();
        for entry in self.entries.iter_mut().filter(|e| e.dir == key) {
            entry.done = true;
        }
        self.save()?;
        debug!("Marked {} done in {}", key, self.path.display());
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let write_error = |source: csv::Error| Error::ResumeLogWrite {
            path: self.path.clone(),
            source,
        };

        let mut writer = csv::Writer::from_path(&self.path).map_err(write_error)?;
        writer
            .write_record([DIR_COLUMN, DONE_COLUMN])
            .map_err(write_error)?;
        for entry in &self.entries {
            let done = if entry.done { DONE } else { PENDING };
            writer
                .write_record([entry.dir.as_str(), done])
                .map_err(write_error)?;
        }
        writer
            .flush()
            .map_err(|e| write_error(csv::Error::from(e)))?;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<Vec<LogEntry>> {
    let read_error = |source: csv::Error| Error::ResumeLogRead {
        path: path.to_path_buf(),
        source,
    };
    let invalid = |message: String| Error::ResumeLogInvalid {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_error)?;

    let headers = reader.headers().map_err(read_error)?.clone();
    let columns: Vec<&str> = headers.iter().collect();
    if columns != [DIR_COLUMN, DONE_COLUMN] {
        return Err(invalid(format!(
            "expected columns '{DIR_COLUMN},{DONE_COLUMN}', found '{}'",
            columns.join(",")
        )));
    }

    let mut entries = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(read_error)?;
        let dir = record.get(0).unwrap_or_default();
        let done = match record.get(1).unwrap_or_default() {
            DONE => true,
            PENDING => false,
            other => {
                return Err(invalid(format!(
                    "line {}: done must be '{DONE}' or '{PENDING}', found '{other}'",
                    line + 2
                )));
            }
        };
        entries.push(LogEntry {
            dir: dir.to_string(),
            done,
        });
    }

    if entries.is_empty() {
        return Err(invalid("log lists no directories".to_string()));
    }
    Ok(entries)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dirs() -> Vec<PathBuf> {
        vec![PathBuf::from("/data/site_b"), PathBuf::from("/data/site_a")]
    }

    #[test]
    fn test_create_marks_everything_pending() {
        let tmp = TempDir::new().unwrap();
        let log = ResumeLog::open_or_create(tmp.path(), &dirs()).unwrap();

        assert_eq!(
            log.pending(),
            vec![PathBuf::from("/data/site_a"), PathBuf::from("/data/site_b")]
        );
        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents, "dir,done\n/data/site_a,no\n/data/site_b,no\n");
    }

    #[test]
    fn test_mark_done_persists() {
        let tmp = TempDir::new().unwrap();
        let mut log = ResumeLog::open_or_create(tmp.path(), &dirs()).unwrap();
        log.mark_done(Path::new("/data/site_a")).unwrap();

        let reopened = ResumeLog::open_or_create(tmp.path(), &dirs()).unwrap();
        assert_eq!(reopened.pending(), vec![PathBuf::from("/data/site_b")]);
    }

    #[test]
    fn test_mismatched_directories_rejected() {
        let tmp = TempDir::new().unwrap();
        ResumeLog::open_or_create(tmp.path(), &dirs()).unwrap();

        let other = vec![PathBuf::from("/data/site_c")];
        assert!(matches!(
            ResumeLog::open_or_create(tmp.path(), &other),
            Err(Error::ResumeLogMismatch {
                logged: 2,
                requested: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_wrong_columns_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(LOG_FILE), "folder,done\n/data/site_a,no\n").unwrap();
        assert!(matches!(
            ResumeLog::open_or_create(tmp.path(), &dirs()),
            Err(Error::ResumeLogInvalid { .. })
        ));
    }

    #[test]
    fn test_bad_done_value_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(LOG_FILE),
            "dir,done\n/data/site_a,maybe\n/data/site_b,no\n",
        )
        .unwrap();
        assert!(matches!(
            ResumeLog::open_or_create(tmp.path(), &dirs()),
            Err(Error::ResumeLogInvalid { .. })
        ));
    }

    #[test]
    fn test_empty_log_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(LOG_FILE), "dir,done\n").unwrap();
        assert!(matches!(
            ResumeLog::open_or_create(tmp.path(), &dirs()),
            Err(Error::ResumeLogInvalid { .. })
        ));
    }

    #[test]
    fn test_extra_column_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(LOG_FILE), "dir,done,note\n/data/site_a,no,x\n").unwrap();
        assert!(matches!(
            ResumeLog::open_or_create(tmp.path(), &dirs()),
            Err(Error::ResumeLogInvalid { .. })
        ));
    }
}
