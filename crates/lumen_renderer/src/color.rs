//! Color type and the display transforms applied when an image is encoded.

use lumen_math::Vec3;

/// Linear scene-referred RGB color.
pub type Color = Vec3;

/// Map linear scene radiance to linear display radiance with Reinhard's operator.
#[inline]
pub fn tonemap_reinhard(color: Color) -> Color {
    color / (Color::ONE + color)
}

/// Encode a linear display color to 8-bit non-linear sRGB.
///
/// Channels are clamped to [0, 1] before the transfer function is applied.
pub fn encode_srgb(color: Color) -> [u8; 3] {
    let encode = |c: f32| {
        let c = c.clamp(0.0, 1.0);
        let v = if c <= 0.003_130_8 {
            12.92 * c
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        };
        (v * 255.0).round() as u8
    };
    [encode(color.x), encode(color.y), encode(color.z)]
}

/// Convert hue, saturation, lightness (all in [0, 1]) to a linear RGB color.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color {
    fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let srgb = if s == 0.0 {
        // achromatic
        Color::splat(l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Color::new(
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
        )
    };
    srgb.powf(2.2)
}
