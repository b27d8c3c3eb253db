use image::{GrayImage, ImageBuffer, Luma, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::VisionError;

/// Largest upscaled bitmap `process` will allocate (2^27 pixels, 512 MiB RGBA)
pub const MAX_OUTPUT_PIXELS: f64 = 134_217_728.0;

/// Single-channel float plane, values in [0, 1]
pub type GrayPlane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Preprocessing parameters. Supplied per call; `process` has no defaults of its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    pub contrast: f32,
    pub threshold: f32,
    pub blur_radius: f32,
    pub scale: f32,
    pub invert: bool,
}

impl PreprocessConfig {
    /// Tuned for photographed relic cards: mild contrast boost, light blur, 2x upscale
    pub const CARD: PreprocessConfig = PreprocessConfig {
        contrast: 1.4,
        threshold: 0.5,
        blur_radius: 0.8,
        scale: 2.0,
        invert: false,
    };

    /// Reject out-of-range parameters. Nothing is clamped.
    pub fn validate(&self) -> Result<(), VisionError> {
        if !(self.contrast.is_finite() && self.contrast > 0.0) {
            return Err(VisionError::InvalidConfig(format!(
                "contrast must be > 0, got {}",
                self.contrast
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(VisionError::InvalidConfig(format!(
                "threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        if !(self.blur_radius.is_finite() && self.blur_radius >= 0.0) {
            return Err(VisionError::InvalidConfig(format!(
                "blur radius must be >= 0, got {}",
                self.blur_radius
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(VisionError::InvalidConfig(format!(
                "scale must be > 0, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// Turn a cropped card image into a black/white bitmap for OCR:
/// 1. Luma + contrast (+ optional invert)
/// 2. Box blur with edge-clipped windows
/// 3. Hard threshold
/// 4. Nearest-neighbor upscale to an opaque RGBA bitmap
pub fn process(image: &RgbaImage, config: &PreprocessConfig) -> Result<RgbaImage, VisionError> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(VisionError::EmptyImage {
            width: w,
            height: h,
        });
    }
    config.validate()?;

    let out_w = (w as f64 * config.scale as f64).round();
    let out_h = (h as f64 * config.scale as f64).round();
    if out_w < 1.0 || out_h < 1.0 || out_w * out_h > MAX_OUTPUT_PIXELS {
        return Err(VisionError::InvalidConfig(format!(
            "scale {} maps {}x{} to an unusable {}x{}",
            config.scale, w, h, out_w, out_h
        )));
    }

    let gray = grayscale_contrast(image, config.contrast, config.invert);
    let blurred = if config.blur_radius > 0.0 {
        box_blur(&gray, config.blur_radius.ceil() as u32)
    } else {
        gray
    };
    let binary = binarize(&blurred, config.threshold);
    Ok(upscale_nearest(&binary, config.scale, out_w as u32, out_h as u32))
}

/// Rec.601 luma normalized to [0, 1], then `clamp01((v - 0.5) * contrast + 0.5)`
pub fn grayscale_contrast(image: &RgbaImage, contrast: f32, invert: bool) -> GrayPlane {
    GrayPlane::from_fn(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y);
        let luma =
            (0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32) / 255.0;
        let v = ((luma - 0.5) * contrast + 0.5).clamp(0.0, 1.0);
        Luma([if invert { 1.0 - v } else { v }])
    })
}

/// Mean over the (2r+1)² window around each sample, clipped at the borders.
/// Each output divides by the number of in-bounds samples actually summed.
pub fn box_blur(plane: &GrayPlane, radius: u32) -> GrayPlane {
    let (w, h) = plane.dimensions();
    if radius == 0 {
        return plane.clone();
    }

    // Summed-area table with a zero row/column on the top-left
    let stride = w as usize + 1;
    let mut sat = vec![0.0f64; stride * (h as usize + 1)];
    for y in 0..h as usize {
        let mut row_sum = 0.0f64;
        for x in 0..w as usize {
            row_sum += plane.get_pixel(x as u32, y as u32)[0] as f64;
            sat[(y + 1) * stride + x + 1] = sat[y * stride + x + 1] + row_sum;
        }
    }

    let r = radius as i64;
    GrayPlane::from_fn(w, h, |x, y| {
        let x0 = (x as i64 - r).max(0) as usize;
        let y0 = (y as i64 - r).max(0) as usize;
        let x1 = (x as i64 + r).min(w as i64 - 1) as usize + 1;
        let y1 = (y as i64 + r).min(h as i64 - 1) as usize + 1;

        let sum = sat[y1 * stride + x1] - sat[y0 * stride + x1] - sat[y1 * stride + x0]
            + sat[y0 * stride + x0];
        let count = ((x1 - x0) * (y1 - y0)) as f64;
        Luma([(sum / count) as f32])
    })
}

/// 255 where the value is strictly above `threshold`, 0 elsewhere
pub fn binarize(plane: &GrayPlane, threshold: f32) -> GrayImage {
    GrayImage::from_fn(plane.width(), plane.height(), |x, y| {
        Luma([if plane.get_pixel(x, y)[0] > threshold { 255 } else { 0 }])
    })
}

fn upscale_nearest(binary: &GrayImage, scale: f32, out_w: u32, out_h: u32) -> RgbaImage {
    let (w, h) = binary.dimensions();
    let scale = scale as f64;
    RgbaImage::from_fn(out_w, out_h, |x, y| {
        let sx = ((x as f64 / scale).floor() as u32).min(w - 1);
        let sy = ((y as f64 / scale).floor() as u32).min(h - 1);
        let v = binary.get_pixel(sx, sy)[0];
        Rgba([v, v, v, 255])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PreprocessConfig {
        PreprocessConfig::CARD
    }

    /// Dark text-like stripes on a light background
    fn make_card(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x / 3 + y / 5) % 2 == 0 {
                Rgba([230, 220, 210, 255])
            } else {
                Rgba([25, 30, 40, 255])
            }
        })
    }

    #[test]
    fn test_output_dimensions() {
        let out = process(&make_card(31, 17), &config()).unwrap();
        assert_eq!(out.dimensions(), (62, 34));

        let cfg = PreprocessConfig { scale: 1.5, ..config() };
        let out = process(&make_card(3, 3), &cfg).unwrap();
        // 4.5 rounds away from zero
        assert_eq!(out.dimensions(), (5, 5));
    }

    #[test]
    fn test_output_is_binary_and_opaque() {
        for scale in [0.5, 1.0, 1.7, 3.0] {
            for blur in [0.0, 0.8, 2.5] {
                let cfg = PreprocessConfig {
                    scale,
                    blur_radius: blur,
                    ..config()
                };
                let out = process(&make_card(40, 25), &cfg).unwrap();
                for px in out.pixels() {
                    assert!(px[0] == 0 || px[0] == 255);
                    assert_eq!(px[0], px[1]);
                    assert_eq!(px[1], px[2]);
                    assert_eq!(px[3], 255);
                }
            }
        }
    }

    #[test]
    fn test_light_becomes_white_dark_becomes_black() {
        let img = RgbaImage::from_fn(10, 4, |x, _| {
            if x < 5 {
                Rgba([240, 240, 240, 255])
            } else {
                Rgba([10, 10, 10, 255])
            }
        });
        let cfg = PreprocessConfig {
            blur_radius: 0.0,
            scale: 1.0,
            ..config()
        };
        let out = process(&img, &cfg).unwrap();
        assert_eq!(out.get_pixel(0, 0)[0], 255);
        assert_eq!(out.get_pixel(9, 0)[0], 0);

        let inverted = process(&img, &PreprocessConfig { invert: true, ..cfg }).unwrap();
        assert_eq!(inverted.get_pixel(0, 0)[0], 0);
        assert_eq!(inverted.get_pixel(9, 0)[0], 255);
    }

    #[test]
    fn test_contrast_clamps_luma() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([250, 250, 250, 255]));
        let plane = grayscale_contrast(&img, 10.0, false);
        assert_eq!(plane.get_pixel(0, 0)[0], 1.0);

        let dark = RgbaImage::from_pixel(2, 2, Rgba([5, 5, 5, 255]));
        let plane = grayscale_contrast(&dark, 10.0, false);
        assert_eq!(plane.get_pixel(0, 0)[0], 0.0);
    }

    #[test]
    fn test_box_blur_divides_by_valid_count() {
        // A uniform plane must stay uniform at the borders
        let plane = GrayPlane::from_pixel(5, 4, Luma([0.6]));
        let blurred = box_blur(&plane, 2);
        for px in blurred.pixels() {
            assert!((px[0] - 0.6).abs() < 1e-6);
        }

        // Corner of a single bright pixel with radius 1: window is 2x2
        let mut plane = GrayPlane::new(3, 3);
        plane.put_pixel(0, 0, Luma([1.0]));
        let blurred = box_blur(&plane, 1);
        assert!((blurred.get_pixel(0, 0)[0] - 0.25).abs() < 1e-6);
        assert!((blurred.get_pixel(1, 1)[0] - 1.0 / 9.0).abs() < 1e-6);
        assert_eq!(blurred.get_pixel(2, 2)[0], 0.0);
    }

    #[test]
    fn test_binarize_is_strict() {
        let plane = GrayPlane::from_fn(3, 1, |x, _| Luma([[0.49, 0.5, 0.51][x as usize]]));
        let bin = binarize(&plane, 0.5);
        assert_eq!(bin.get_pixel(0, 0)[0], 0);
        assert_eq!(bin.get_pixel(1, 0)[0], 0);
        assert_eq!(bin.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_zero_area_rejected() {
        let img = RgbaImage::new(0, 10);
        assert_eq!(
            process(&img, &config()),
            Err(VisionError::EmptyImage { width: 0, height: 10 })
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let img = make_card(8, 8);
        for cfg in [
            PreprocessConfig { contrast: 0.0, ..config() },
            PreprocessConfig { contrast: -1.0, ..config() },
            PreprocessConfig { threshold: 1.2, ..config() },
            PreprocessConfig { threshold: -0.1, ..config() },
            PreprocessConfig { blur_radius: -1.0, ..config() },
            PreprocessConfig { scale: 0.0, ..config() },
            PreprocessConfig { scale: 0.01, ..config() },
            PreprocessConfig { scale: 1.0e9, ..config() },
            PreprocessConfig { scale: f32::MAX, ..config() },
        ] {
            assert!(
                matches!(process(&img, &cfg), Err(VisionError::InvalidConfig(_))),
                "expected rejection for {:?}",
                cfg
            );
        }
    }

    #[test]
    fn test_output_size_cap() {
        // 8 * 2000 = 16000 per side, 256M pixels
        let huge = PreprocessConfig { scale: 2000.0, ..config() };
        assert!(matches!(
            process(&make_card(8, 8), &huge),
            Err(VisionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        let img = make_card(23, 19);
        let a = process(&img, &config()).unwrap();
        let b = process(&img, &config()).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
