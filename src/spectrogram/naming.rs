//! File names of saved spectrogram images.
//!
//! Format: `IMG_<stem>_<index:05>_<start_ms>_<end_ms>.png`. The stem may
//! itself contain underscores, so parsing works from the right.

use std::fmt;
use std::str::FromStr;

const PREFIX: &str = "IMG_";
const EXTENSION: &str = ".png";

/// Identity of one saved segment image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentImageName {
    /// Recording file stem.
    pub stem: String,
    /// 1-based segment index.
    pub index: usize,
    /// Segment start in milliseconds.
    pub start_ms: u64,
    /// Segment end in milliseconds.
    pub end_ms: u64,
}

impl fmt::Display for SegmentImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PREFIX}{}_{:05}_{}_{}{EXTENSION}",
            self.stem, self.index, self.start_ms, self.end_ms
        )
    }
}

impl FromStr for SegmentImageName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("not a segment image name: {s}");

        let body = s
            .strip_prefix(PREFIX)
            .and_then(|rest| rest.strip_suffix(EXTENSION))
            .ok_or_else(invalid)?;

        let mut parts = body.rsplitn(4, '_');
        let end_ms = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let start_ms = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let index = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let stem = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;

        Ok(Self {
            stem: stem.to_string(),
            index,
            start_ms,
            end_ms,
        })
    }
}
