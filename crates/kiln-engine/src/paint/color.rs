/// Linear RGBA color (straight alpha).
///
/// Clear colors are written to sRGB surfaces as linear values; construct from
/// sRGB bytes with [`Color::from_srgb_u8`] so authored colors keep their look.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::from_linear(0.0, 0.0, 0.0, 1.0);

    /// Authoring color used as the editor backdrop (sRGB 100, 149, 237).
    pub fn cornflower_blue() -> Self {
        Self::from_srgb_u8(100, 149, 237, 255)
    }

    #[inline]
    pub const fn from_linear(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a linear color from sRGB-encoded bytes. Alpha is linear already.
    pub fn from_srgb_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: srgb_to_linear(r as f32 / 255.0),
            g: srgb_to_linear(g as f32 / 255.0),
            b: srgb_to_linear(b as f32 / 255.0),
            a: a as f32 / 255.0,
        }
    }

    /// Creates a linear color from sRGB-encoded `[r, g, b]` in `[0, 1]`.
    pub fn from_srgb(rgb: [f32; 3]) -> Self {
        Self {
            r: srgb_to_linear(rgb[0].clamp(0.0, 1.0)),
            g: srgb_to_linear(rgb[1].clamp(0.0, 1.0)),
            b: srgb_to_linear(rgb[2].clamp(0.0, 1.0)),
            a: 1.0,
        }
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_endpoints_are_preserved() {
        let white = Color::from_srgb_u8(255, 255, 255, 255);
        assert!((white.r - 1.0).abs() < 1e-6);
        let black = Color::from_srgb_u8(0, 0, 0, 255);
        assert_eq!(black, Color::BLACK);
    }

    #[test]
    fn mid_grey_is_darker_in_linear() {
        let grey = Color::from_srgb_u8(128, 128, 128, 255);
        assert!(grey.r > 0.2 && grey.r < 0.23);
    }

    #[test]
    fn from_srgb_clamps_out_of_range() {
        let c = Color::from_srgb([2.0, -1.0, 0.0]);
        assert!((c.r - 1.0).abs() < 1e-6);
        assert_eq!(c.g, 0.0);
    }
}
