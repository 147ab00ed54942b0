//! Directory and recording discovery.

use crate::constants::audio::WAV_EXTENSION;
use crate::error::Result;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Resolve the directories to analyse.
///
/// With `recursive`, every directory under the roots that directly contains
/// a wave file is returned; otherwise existing roots are used as given. The
/// result is sorted and free of duplicates.
pub fn discover_directories(roots: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();

    for root in roots {
        if !root.is_dir() {
            warn!("Skipping non-existent directory: {}", root.display());
            continue;
        }
        if recursive {
            collect_wav_dirs_recursive(root, &mut dirs)?;
        } else {
            dirs.push(root.clone());
        }
    }

    dirs.sort();
    dirs.dedup();
    Ok(dirs)
}

fn collect_wav_dirs_recursive(dir: &Path, dirs: &mut Vec<PathBuf>) -> Result<()> {
    let mut has_wav = false;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // Symlinked directories are not followed.
        if entry.file_type()?.is_dir() {
            collect_wav_dirs_recursive(&path, dirs)?;
        } else if !has_wav && is_wav_file(&path) {
            has_wav = true;
        }
    }
    if has_wav {
        dirs.push(dir.to_path_buf());
    }
    Ok(())
}

/// List the wave files directly inside `dir`, sorted.
pub fn list_recordings(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_wav_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Check for a `.wav` extension in any letter case.
pub fn is_wav_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(OsStr::new(WAV_EXTENSION)))
}
