use image::RgbaImage;
use relic_data::ColorCategory;
use tracing::debug;

use crate::error::VisionError;

/// Stride between sampled pixels along each axis
const SAMPLE_STRIDE: usize = 4;

/// Samples darker or brighter than this are frame noise
const MIN_BRIGHTNESS: f64 = 30.0;
const MAX_BRIGHTNESS: f64 = 230.0;

/// Minimum max-min channel spread for a sample to count as colored
const MIN_CHROMA: u8 = 25;

/// Fewer accepted samples than this means the color is unknown
const MIN_SAMPLES: usize = 10;

/// Sampling rectangle as fractions of the frame, `[x1, y1, x2, y2)`
struct Region {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

/// Where the relic card's colored border shows outside the text block:
/// three corners and the left/right strips at mid-height.
const REGIONS: [Region; 5] = [
    Region { x1: 0.0, y1: 0.0, x2: 0.15, y2: 0.15 },
    Region { x1: 0.85, y1: 0.0, x2: 1.0, y2: 0.15 },
    Region { x1: 0.0, y1: 0.85, x2: 0.15, y2: 1.0 },
    Region { x1: 0.0, y1: 0.3, x2: 0.08, y2: 0.7 },
    Region { x1: 0.92, y1: 0.3, x2: 1.0, y2: 0.7 },
];

/// Detect the relic color from the border of an uncropped frame.
///
/// Returns `Ok(None)` when fewer than 10 border pixels carry a usable color.
pub fn detect_color(frame: &RgbaImage) -> Result<Option<ColorCategory>, VisionError> {
    let (w, h) = frame.dimensions();
    if w == 0 || h == 0 {
        return Err(VisionError::EmptyImage {
            width: w,
            height: h,
        });
    }

    let mut count = 0usize;
    let mut sin_sum = 0.0f64;
    let mut cos_sum = 0.0f64;

    for region in &REGIONS {
        let x1 = (w as f64 * region.x1).floor() as u32;
        let y1 = (h as f64 * region.y1).floor() as u32;
        let x2 = ((w as f64 * region.x2).floor() as u32).min(w);
        let y2 = ((h as f64 * region.y2).floor() as u32).min(h);

        for y in (y1..y2).step_by(SAMPLE_STRIDE) {
            for x in (x1..x2).step_by(SAMPLE_STRIDE) {
                let px = frame.get_pixel(x, y);
                let (r, g, b) = (px[0], px[1], px[2]);
                if !is_color_cue(r, g, b) {
                    continue;
                }
                let hue = rgb_to_hue(r, g, b).to_radians();
                sin_sum += hue.sin();
                cos_sum += hue.cos();
                count += 1;
            }
        }
    }

    if count < MIN_SAMPLES {
        debug!("Color sampling: only {} usable samples", count);
        return Ok(None);
    }

    let mean_hue = circular_mean_degrees(sin_sum, cos_sum);
    let color = color_from_hue(mean_hue);
    debug!(
        "Color sampling: {} samples, mean hue {:.1} -> {}",
        count, mean_hue, color
    );
    Ok(Some(color))
}

fn is_color_cue(r: u8, g: u8, b: u8) -> bool {
    let brightness = (r as f64 + g as f64 + b as f64) / 3.0;
    if !(MIN_BRIGHTNESS..=MAX_BRIGHTNESS).contains(&brightness) {
        return false;
    }
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    max - min >= MIN_CHROMA
}

/// HSV hue in degrees, [0, 360). Gray maps to 0.
pub fn rgb_to_hue(r: u8, g: u8, b: u8) -> f64 {
    let (r, g, b) = (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let d = max - min;
    if d == 0.0 {
        return 0.0;
    }
    let h = if max == r {
        ((g - b) / d).rem_euclid(6.0)
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h * 60.0).rem_euclid(360.0)
}

/// Mean angle of the accumulated unit vectors, in [0, 360)
pub fn circular_mean_degrees(sin_sum: f64, cos_sum: f64) -> f64 {
    sin_sum.atan2(cos_sum).to_degrees().rem_euclid(360.0)
}

/// Map any hue to its band:
/// [330, 360) and [0, 30) Red, [30, 70) Yellow, [70, 170) Green, [170, 330) Blue
pub fn color_from_hue(hue: f64) -> ColorCategory {
    let h = hue.rem_euclid(360.0);
    if !(30.0..330.0).contains(&h) {
        ColorCategory::Red
    } else if h < 70.0 {
        ColorCategory::Yellow
    } else if h < 170.0 {
        ColorCategory::Green
    } else {
        ColorCategory::Blue
    }
}
