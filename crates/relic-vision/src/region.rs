use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::VisionError;

/// Normalized crop box (0.0-1.0 coordinates relative to the full frame)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    /// Card text block inside a photo framed on the card
    pub const CARD: CropRegion = CropRegion {
        x: 0.05,
        y: 0.08,
        width: 0.90,
        height: 0.84,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole frame
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn validate(&self) -> Result<(), VisionError> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(self.x) || !in_unit(self.y) {
            return Err(VisionError::InvalidConfig(format!(
                "crop origin must be within 0..=1, got ({}, {})",
                self.x, self.y
            )));
        }
        if !(self.width > 0.0 && self.height > 0.0)
            || self.x + self.width > 1.0 + f64::EPSILON
            || self.y + self.height > 1.0 + f64::EPSILON
        {
            return Err(VisionError::InvalidConfig(format!(
                "crop {}x{} at ({}, {}) leaves the frame",
                self.width, self.height, self.x, self.y
            )));
        }
        Ok(())
    }
}

/// Crop a frame to a normalized region
pub fn crop_frame(frame: &RgbaImage, region: &CropRegion) -> Result<RgbaImage, VisionError> {
    let (w, h) = (frame.width(), frame.height());
    if w == 0 || h == 0 {
        return Err(VisionError::EmptyImage {
            width: w,
            height: h,
        });
    }
    region.validate()?;

    let x = (region.x * w as f64) as u32;
    let y = (region.y * h as f64) as u32;
    let rw = (region.width * w as f64).round() as u32;
    let rh = (region.height * h as f64).round() as u32;

    // Clamp to image bounds
    let x = x.min(w - 1);
    let y = y.min(h - 1);
    let rw = rw.clamp(1, w - x);
    let rh = rh.clamp(1, h - y);

    Ok(image::imageops::crop_imm(frame, x, y, rw, rh).to_image())
}
