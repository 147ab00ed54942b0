//! Segment to image rendering.

use crate::audio::segments::Segment;
use crate::constants::spectrogram::{
    GRIDLINE_SPACING_HZ, IMAGE_DIR, IMAGE_HEIGHT, IMAGE_WIDTH, MAX_FREQUENCY_HZ, POWER_FLOOR,
};
use crate::constants::{DEFAULT_NOISE_WEIGHT, DEFAULT_SEGMENT_DURATION};
use crate::error::{Error, Result};
use crate::spectrogram::naming::SegmentImageName;
use crate::spectrogram::palette::ColourScale;
use crate::spectrogram::stft::{Spectrogram, noise_floor, spectral_subtraction};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// Rendering settings shared by every segment of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Palette applied to normalized power.
    pub colour_scale: ColourScale,
    /// Spectral subtraction weight; 0 disables noise suppression.
    pub noise_weight: f32,
    /// Draw white rows every 20 kHz.
    pub gridlines: bool,
    /// Nominal segment duration in seconds.
    pub segment_duration: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            colour_scale: ColourScale::default(),
            noise_weight: DEFAULT_NOISE_WEIGHT,
            gridlines: true,
            segment_duration: DEFAULT_SEGMENT_DURATION,
        }
    }
}

/// A rendered segment with the time bounds needed to map pixels back to time.
#[derive(Debug, Clone)]
pub struct SpectrogramImage {
    /// The 1280x400 raster, low frequencies at the bottom.
    pub image: DynamicImage,
    /// 1-based segment index.
    pub index: usize,
    /// Segment start in milliseconds.
    pub start_ms: u64,
    /// Segment end in milliseconds.
    pub end_ms: u64,
}

impl SpectrogramImage {
    /// Render a segment.
    pub fn from_segment(
        segment: &Segment<'_>,
        sample_rate: u32,
        options: &RenderOptions,
    ) -> Result<Self> {
        Ok(Self {
            image: render(segment.samples, sample_rate, options)?,
            index: segment.index,
            start_ms: segment.start_ms,
            end_ms: segment.end_ms,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// File name of this image for a recording with the given stem.
    pub fn file_name(&self, stem: &str) -> SegmentImageName {
        SegmentImageName {
            stem: stem.to_string(),
            index: self.index,
            start_ms: self.start_ms,
            end_ms: self.end_ms,
        }
    }

    /// Save as PNG into the `img` directory next to the recording.
    pub fn save_png(&self, recording: &Path) -> Result<PathBuf> {
        let dir = recording
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
            .join(IMAGE_DIR);
        std::fs::create_dir_all(&dir).map_err(|source| Error::OutputDirCreateFailed {
            path: dir.clone(),
            source,
        })?;

        let stem = recording
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = dir.join(self.file_name(&stem).to_string());
        self.image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| Error::ImageSave {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Render segment samples to a fixed-size spectrogram image.
pub fn render(samples: &[f32], sample_rate: u32, options: &RenderOptions) -> Result<DynamicImage> {
    let denoised;
    let samples: &[f32] = if options.noise_weight > 0.0 {
        let floor = noise_floor(samples, sample_rate);
        denoised = spectral_subtraction(samples, floor, f64::from(options.noise_weight))?;
        &denoised
    } else {
        samples
    };

    let mut spectrogram = Spectrogram::compute(samples, sample_rate)?;
    spectrogram.limit_frequency(MAX_FREQUENCY_HZ);
    spectrogram.pad_time(options.segment_duration);

    let levels = normalized_levels(&spectrogram);
    let raster = colourize(&levels, spectrogram.bin_count(), options.colour_scale)?;

    let mut image = raster.resize_exact(IMAGE_WIDTH, IMAGE_HEIGHT, FilterType::Lanczos3);
    if options.gridlines {
        draw_gridlines(&mut image);
    }
    Ok(image)
}

/// Log-scale power and min-max normalize to `[0, 1]`.
///
/// Returns one vector of bin levels per frame. A constant spectrogram
/// normalizes to all zeros.
fn normalized_levels(spectrogram: &Spectrogram) -> Vec<Vec<f64>> {
    let log: Vec<Vec<f64>> = spectrogram
        .frames()
        .iter()
        .map(|frame| {
            frame
                .iter()
                .map(|p| 10.0 * (p + POWER_FLOOR).log10())
                .collect()
        })
        .collect();

    let (min, max) = log
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    log.into_iter()
        .map(|frame| {
            frame
                .into_iter()
                .map(|v| if range > 0.0 { (v - min) / range } else { 0.0 })
                .collect()
        })
        .collect()
}

/// Map levels through the palette, high frequencies on the top row.
fn colourize(levels: &[Vec<f64>], bins: usize, scale: ColourScale) -> Result<DynamicImage> {
    let (Ok(width), Ok(height)) = (u32::try_from(levels.len()), u32::try_from(bins)) else {
        return Err(Error::Internal {
            message: "spectrogram too large to render".to_string(),
        });
    };
    if width == 0 || height == 0 {
        return Err(Error::Internal {
            message: "spectrogram has no frames to render".to_string(),
        });
    }

    let palette = scale.palette();
    let level_at = |x: u32, y: u32| levels[x as usize][bins - 1 - y as usize];

    let image = if scale.is_grayscale() {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
            Luma([palette.map(level_at(x, y))[0]])
        }))
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb(palette.map(level_at(x, y)))
        }))
    };
    Ok(image)
}

/// Pixel rows of the frequency gridlines, counted from the top.
///
/// Lines sit at 0, 20, ..., 100 kHz; the 120 kHz edge gets none.
pub fn gridline_rows(height: u32) -> Vec<u32> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max_hz = MAX_FREQUENCY_HZ as u32;
    (0..max_hz)
        .step_by(GRIDLINE_SPACING_HZ as usize)
        .map(|freq| {
            let position = f64::from(freq) / MAX_FREQUENCY_HZ * f64::from(height);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let row = position.round() as u32;
            row.min(height.saturating_sub(1))
        })
        .collect()
}

fn draw_gridlines(image: &mut DynamicImage) {
    let width = image.width();
    let rows = gridline_rows(image.height());
    match image {
        DynamicImage::ImageLuma8(gray) => {
            for &y in &rows {
                for x in 0..width {
                    gray.put_pixel(x, y, Luma([255]));
                }
            }
        }
        DynamicImage::ImageRgb8(rgb) => {
            for &y in &rows {
                for x in 0..width {
                    rgb.put_pixel(x, y, Rgb([255, 255, 255]));
                }
            }
        }
        other => {
            let mut rgb = other.to_rgb8();
            for &y in &rows {
                for x in 0..width {
                    rgb.put_pixel(x, y, Rgb([255, 255, 255]));
                }
            }
            *other = DynamicImage::ImageRgb8(rgb);
        }
    }
}
