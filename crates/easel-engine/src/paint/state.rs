use super::Color;

/// Horizontal anchoring of text relative to the `x` passed to `draw_string`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }

    /// Offset to apply to a line of `width` so it honors this alignment.
    #[inline]
    pub fn offset(self, width: f32) -> f32 {
        match self {
            TextAlign::Left => 0.0,
            TextAlign::Center => -width * 0.5,
            TextAlign::Right => -width,
        }
    }
}

/// Current style attributes applied to subsequent drawing.
///
/// A pure value holder. The `set_*` methods clamp their input and return the
/// value actually stored so callers can record exactly what was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintState {
    pub color: Color,
    /// Global opacity multiplier in `[0, 1]`.
    pub alpha: f32,
    pub stroke_width: f32,
    /// Round caps and joins when `true`, square otherwise.
    pub stroke_round: bool,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub font_family: String,
    pub align: TextAlign,
    /// Multiplier on the font's natural line height for multi-line strings.
    pub line_spacing: f32,
}

pub const DEFAULT_FONT_SIZE: f32 = 16.0;
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";

impl Default for PaintState {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            alpha: 1.0,
            stroke_width: 1.0,
            stroke_round: false,
            font_size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            align: TextAlign::Left,
            line_spacing: 1.0,
        }
    }
}

impl PaintState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores every attribute to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_color(&mut self, color: Color) -> Color {
        self.color = color;
        color
    }

    pub fn set_alpha(&mut self, alpha: f32) -> f32 {
        self.alpha = clamp_unit(alpha);
        self.alpha
    }

    pub fn set_stroke_width(&mut self, width: f32) -> f32 {
        self.stroke_width = clamp_extent(width);
        self.stroke_width
    }

    pub fn set_stroke_round(&mut self, round: bool) -> bool {
        self.stroke_round = round;
        round
    }

    pub fn set_font(&mut self, size: f32, bold: bool, italic: bool) -> (f32, bool, bool) {
        self.font_size = clamp_extent(size);
        self.bold = bold;
        self.italic = italic;
        (self.font_size, bold, italic)
    }

    pub fn set_font_family(&mut self, family: &str) {
        self.font_family = family.to_string();
    }

    pub fn set_align(&mut self, align: TextAlign) -> TextAlign {
        self.align = align;
        align
    }

    pub fn set_line_spacing(&mut self, spacing: f32) -> f32 {
        self.line_spacing = clamp_extent(spacing);
        self.line_spacing
    }

    /// Color with the global alpha folded in, as handed to rasterizers.
    #[inline]
    pub fn effective_color(&self) -> Color {
        self.color.with_opacity(self.alpha)
    }
}

/// Clamps a length-like value to `>= 0`; non-finite input saturates to `f32::MAX`.
#[inline]
pub fn clamp_extent(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { f32::MAX }
}

/// Clamps an opacity to `[0, 1]`; NaN falls back to fully opaque.
#[inline]
pub fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 1.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extents_clamp_and_saturate() {
        let mut s = PaintState::new();
        assert_eq!(s.set_stroke_width(-3.0), 0.0);
        assert_eq!(s.set_stroke_width(f32::NAN), f32::MAX);
        assert_eq!(s.set_line_spacing(f32::INFINITY), f32::MAX);
        assert_eq!(s.set_line_spacing(1.5), 1.5);
        assert_eq!(s.set_font(-1.0, true, false), (0.0, true, false));
    }

    #[test]
    fn alpha_clamps_to_unit_range() {
        let mut s = PaintState::new();
        assert_eq!(s.set_alpha(2.0), 1.0);
        assert_eq!(s.set_alpha(-0.5), 0.0);
        assert_eq!(s.set_alpha(f32::NAN), 1.0);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut s = PaintState::new();
        s.set_color(Color::rgb(1, 2, 3));
        s.set_align(TextAlign::Right);
        s.set_font_family("serif");
        s.reset();
        assert_eq!(s, PaintState::default());
    }

    #[test]
    fn alignment_offsets() {
        assert_eq!(TextAlign::Left.offset(10.0), 0.0);
        assert_eq!(TextAlign::Center.offset(10.0), -5.0);
        assert_eq!(TextAlign::Right.offset(10.0), -10.0);
    }
}
