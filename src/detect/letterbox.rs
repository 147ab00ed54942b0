//! Aspect-preserving resize into the model input, padded with grey.

use crate::constants::detection::LETTERBOX_FILL;
use crate::detect::BoxPrediction;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

/// Geometry of a letterbox transform from a source image to model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    scale: f32,
    pad_left: u32,
    pad_top: u32,
    source_width: u32,
    source_height: u32,
    target_width: u32,
    target_height: u32,
}

impl Letterbox {
    /// Compute the transform for a source size into a target size.
    pub fn new(source: (u32, u32), target: (u32, u32)) -> Self {
        let (sw, sh) = source;
        let (tw, th) = target;
        #[allow(clippy::cast_precision_loss)]
        let scale = (tw as f32 / sw.max(1) as f32).min(th as f32 / sh.max(1) as f32);

        let (new_w, new_h) = scaled_size(source, scale);
        #[allow(clippy::cast_precision_loss)]
        let pad_w = (tw - new_w.min(tw)) as f32 / 2.0;
        #[allow(clippy::cast_precision_loss)]
        let pad_h = (th - new_h.min(th)) as f32 / 2.0;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (pad_left, pad_top) = (
            (pad_w - 0.1).round().max(0.0) as u32,
            (pad_h - 0.1).round().max(0.0) as u32,
        );

        Self {
            scale,
            pad_left,
            pad_top,
            source_width: sw,
            source_height: sh,
            target_width: tw,
            target_height: th,
        }
    }

    /// Scale factor from source to target pixels.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Left and top padding in target pixels.
    pub fn padding(&self) -> (u32, u32) {
        (self.pad_left, self.pad_top)
    }

    /// Render the source image into a padded target-size RGB image.
    pub fn apply(&self, image: &DynamicImage) -> RgbImage {
        let (new_w, new_h) = scaled_size((self.source_width, self.source_height), self.scale);
        let resized = image
            .resize_exact(new_w.max(1), new_h.max(1), FilterType::Triangle)
            .to_rgb8();

        let mut canvas = RgbImage::from_pixel(
            self.target_width,
            self.target_height,
            Rgb([LETTERBOX_FILL; 3]),
        );
        image::imageops::overlay(
            &mut canvas,
            &resized,
            i64::from(self.pad_left),
            i64::from(self.pad_top),
        );
        canvas
    }

    /// Map a box from target pixels back to source pixels, clipped to the
    /// source image.
    pub fn unmap(&self, prediction: BoxPrediction) -> BoxPrediction {
        #[allow(clippy::cast_precision_loss)]
        let (left, top) = (self.pad_left as f32, self.pad_top as f32);
        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (self.source_width as f32, self.source_height as f32);

        BoxPrediction {
            x_min: ((prediction.x_min - left) / self.scale).clamp(0.0, w),
            y_min: ((prediction.y_min - top) / self.scale).clamp(0.0, h),
            x_max: ((prediction.x_max - left) / self.scale).clamp(0.0, w),
            y_max: ((prediction.y_max - top) / self.scale).clamp(0.0, h),
            ..prediction
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scaled_size((w, h): (u32, u32), scale: f32) -> (u32, u32) {
    (
        (w as f32 * scale).round() as u32,
        (h as f32 * scale).round() as u32,
    )
}
