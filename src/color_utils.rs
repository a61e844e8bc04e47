//! Color utility functions shared across the engine.
//!
//! New regions get a deterministic color derived from their id, so replaying
//! the same actions always produces the same colors.

use crate::constants::{REGION_COLOR_SATURATION, REGION_COLOR_VALUE};

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// Format an RGB triple (0.0-1.0 per channel) as a `#rrggbb` CSS color.
pub fn rgb_to_hex(r: f32, g: f32, b: f32) -> String {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b))
}

/// Color for the n-th generated region.
///
/// Hues step by the golden angle so neighbouring ids stay visually distinct.
pub fn region_color(n: u64) -> String {
    let hue = ((n % 360) as f32 * 137.5) % 360.0;
    let (r, g, b) = hsv_to_rgb(hue, REGION_COLOR_SATURATION, REGION_COLOR_VALUE);
    rgb_to_hex(r, g, b)
}
