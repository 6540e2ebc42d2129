use serde::{Deserialize, Serialize};

/// Upper end of the safety hue band (red at 0.0, green at 0.30).
pub const HUE_SPAN: f64 = 0.30;
pub const SAFETY_SATURATION: f64 = 0.9;
pub const SAFETY_LIGHTNESS: f64 = 0.5;

// Struct to represent a color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Build a color from a packed `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xff) as f32;
        let g = ((hex >> 8) & 0xff) as f32;
        let b = (hex & 0xff) as f32;
        Color {
            r: r / 255.0,
            g: g / 255.0,
            b: b / 255.0,
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Safety score to hue, clamped into [0, HUE_SPAN]. NaN counts as 0.
pub fn safety_hue(score: f64) -> f64 {
    let clamped = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
    clamped * HUE_SPAN
}

/// Material base color for a safety score.
pub fn safety_color(score: f64) -> Color {
    hsl_to_rgb(safety_hue(score), SAFETY_SATURATION, SAFETY_LIGHTNESS)
}

/// Standard HSL to RGB conversion; `h`, `s` and `l` are in [0, 1].
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Color {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return Color {
            r: l as f32,
            g: l as f32,
            b: l as f32,
        };
    }

    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    Color {
        r: hue_to_channel(p, q, h + 1.0 / 3.0) as f32,
        g: hue_to_channel(p, q, h) as f32,
        b: hue_to_channel(p, q, h - 1.0 / 3.0) as f32,
    }
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}
