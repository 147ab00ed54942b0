//! Spectrogram rendering: STFT analysis, noise suppression, colour mapping
//! and image output.

pub mod naming;
pub mod palette;
pub mod render;
pub mod stft;

pub use naming::SegmentImageName;
pub use palette::ColourScale;
pub use render::{RenderOptions, SpectrogramImage, render};
