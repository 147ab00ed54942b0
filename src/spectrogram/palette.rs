//! Colour palettes for spectrogram images.
//!
//! Each palette is a 256-entry lookup table built by linear interpolation
//! between anchor points, matching the common `jet`, `gray` and `hot` maps.

use serde::{Deserialize, Serialize};

/// Number of entries in a palette lookup table.
pub const PALETTE_SIZE: usize = 256;

/// Anchor points `(position, value)` for one colour channel.
type Anchors = &'static [(f64, f64)];

const JET: [Anchors; 3] = [
    &[(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)],
    &[
        (0.0, 0.0),
        (0.125, 0.0),
        (0.375, 1.0),
        (0.64, 1.0),
        (0.91, 0.0),
        (1.0, 0.0),
    ],
    &[(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)],
];

const GRAY: [Anchors; 3] = [
    &[(0.0, 0.0), (1.0, 1.0)],
    &[(0.0, 0.0), (1.0, 1.0)],
    &[(0.0, 0.0), (1.0, 1.0)],
];

const HOT: [Anchors; 3] = [
    &[(0.0, 0.0416), (0.365_079, 1.0), (1.0, 1.0)],
    &[(0.0, 0.0), (0.365_079, 0.0), (0.746_032, 1.0), (1.0, 1.0)],
    &[(0.0, 0.0), (0.746_032, 0.0), (1.0, 1.0)],
];

/// Named colour scale applied to normalized spectrogram power.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColourScale {
    /// Blue to red rainbow.
    #[default]
    Jet,
    /// Black to white, rendered as a single-channel image.
    Gray,
    /// Black through red and yellow to white.
    Hot,
}

impl ColourScale {
    /// Whether images in this scale carry a single luminance channel.
    pub fn is_grayscale(self) -> bool {
        matches!(self, Self::Gray)
    }

    /// Build the 256-entry RGB lookup table.
    pub fn palette(self) -> Palette {
        let anchors = match self {
            Self::Jet => &JET,
            Self::Gray => &GRAY,
            Self::Hot => &HOT,
        };
        Palette::from_anchors(anchors)
    }
}

impl std::fmt::Display for ColourScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jet => write!(f, "jet"),
            Self::Gray => write!(f, "gray"),
            Self::Hot => write!(f, "hot"),
        }
    }
}

impl std::str::FromStr for ColourScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jet" => Ok(Self::Jet),
            "gray" | "grey" => Ok(Self::Gray),
            "hot" => Ok(Self::Hot),
            other => Err(format!("unknown colour scale: {other}")),
        }
    }
}

/// RGB lookup table with 8-bit entries.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<[u8; 3]>,
}

impl Palette {
    fn from_anchors(anchors: &[Anchors; 3]) -> Self {
        let entries = (0..PALETTE_SIZE)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let x = i as f64 / (PALETTE_SIZE - 1) as f64;
                let mut rgb = [0u8; 3];
                for (channel, points) in rgb.iter_mut().zip(anchors) {
                    *channel = to_byte(interpolate(points, x));
                }
                rgb
            })
            .collect();
        Self { entries }
    }

    /// Colour for a value in `[0, 1]`. Values outside the range are clamped.
    pub fn map(&self, value: f64) -> [u8; 3] {
        self.entries[index_for(value)]
    }

    /// Table entry at `index`.
    pub fn entry(&self, index: usize) -> Option<[u8; 3]> {
        self.entries.get(index).copied()
    }
}

/// Table index for a normalized value: `floor(value * 256)`, capped at 255.
fn index_for(value: f64) -> usize {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let index = (value * PALETTE_SIZE as f64) as usize;
    index.min(PALETTE_SIZE - 1)
}

/// Truncating conversion of a channel intensity to 8 bits.
fn to_byte(value: f64) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let byte = (value.clamp(0.0, 1.0) * 255.0) as u8;
    byte
}

fn interpolate(points: &[(f64, f64)], x: f64) -> f64 {
    let Some(&(first_x, first_y)) = points.first() else {
        return 0.0;
    };
    if x <= first_x {
        return first_y;
    }
    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            let span = x1 - x0;
            if span <= 0.0 {
                return y1;
            }
            return (x - x0) / span * (y1 - y0) + y0;
        }
    }
    points.last().map_or(0.0, |&(_, y)| y)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_scale_from_str() {
        assert_eq!("jet".parse::<ColourScale>().ok(), Some(ColourScale::Jet));
        assert_eq!("GRAY".parse::<ColourScale>().ok(), Some(ColourScale::Gray));
        assert_eq!("grey".parse::<ColourScale>().ok(), Some(ColourScale::Gray));
        assert_eq!("hot".parse::<ColourScale>().ok(), Some(ColourScale::Hot));
        assert!("viridis".parse::<ColourScale>().is_err());
    }

    #[test]
    fn test_colour_scale_display_round_trips() {
        for scale in [ColourScale::Jet, ColourScale::Gray, ColourScale::Hot] {
            assert_eq!(scale.to_string().parse::<ColourScale>().ok(), Some(scale));
        }
    }

    #[test]
    fn test_jet_endpoints() {
        let palette = ColourScale::Jet.palette();
        assert_eq!(palette.map(0.0), [0, 0, 127]);
        assert_eq!(palette.map(1.0), [127, 0, 0]);
        // Middle of the table is green-dominant
        let mid = palette.map(0.5);
        assert!(mid[1] > 200);
    }

    #[test]
    fn test_gray_is_identity() {
        let palette = ColourScale::Gray.palette();
        for i in 0..PALETTE_SIZE {
            let [r, g, b] = palette.entry(i).unwrap();
            assert_eq!(usize::from(r), i);
            assert_eq!(r, g);
            assert_eq!(g, b);
        }
    }

    #[test]
    fn test_hot_endpoints() {
        let palette = ColourScale::Hot.palette();
        assert_eq!(palette.map(0.0), [10, 0, 0]);
        assert_eq!(palette.map(1.0), [255, 255, 255]);
    }

    #[test]
    fn test_index_truncates_and_clamps() {
        assert_eq!(index_for(0.0), 0);
        assert_eq!(index_for(-1.0), 0);
        assert_eq!(index_for(f64::NAN), 0);
        assert_eq!(index_for(0.5), 128);
        assert_eq!(index_for(0.999), 255);
        assert_eq!(index_for(1.0), 255);
        assert_eq!(index_for(3.0), 255);
    }
}
