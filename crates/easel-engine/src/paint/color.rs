/// Straight-alpha sRGB color, one byte per channel.
///
/// Channels are stored already clamped; every constructor that accepts wider
/// integers saturates into `[0, 255]`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Clamps each channel into `[0, 255]`.
    ///
    /// `Color::clamped(300, -10, 0, 255)` yields `(255, 0, 0, 255)`.
    #[inline]
    pub fn clamped(r: i32, g: i32, b: i32, a: i32) -> Self {
        Self::rgba(clamp_channel(r), clamp_channel(g), clamp_channel(b), clamp_channel(a))
    }

    /// Returns the straight-alpha channels as `f32` in `[0, 1]`.
    #[inline]
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    /// Same color with its alpha multiplied by a global opacity in `[0, 1]`.
    #[inline]
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

#[inline]
fn clamp_channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_channels() {
        assert_eq!(Color::clamped(300, -10, 0, 255), Color::rgb(255, 0, 0));
        assert_eq!(Color::clamped(12, 999, -1, 1000).a, 255);
    }

    #[test]
    fn opacity_scales_alpha_only() {
        let c = Color::rgba(10, 20, 30, 200).with_opacity(0.5);
        assert_eq!(c, Color::rgba(10, 20, 30, 100));
        assert_eq!(Color::WHITE.with_opacity(7.0).a, 255);
    }
}
