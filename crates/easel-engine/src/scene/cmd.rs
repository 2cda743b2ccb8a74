use crate::coords::{Rect, Vec2};
use crate::paint::{Color, PaintState, TextAlign};

/// Image placement recorded by `draw_image` / `draw_image_centered`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCmd {
    pub at: Vec2,
    pub scale: f32,
    /// Rotation in degrees, clockwise.
    pub angle: f32,
    pub path: String,
    /// `at` is the image center rather than its top-left corner.
    pub centered: bool,
}

/// One recorded canvas operation.
///
/// Style variants mutate the replay context; every other variant only carries
/// its own operands and draws with whatever style was last applied earlier in
/// the same stream.
///
/// Extending the stream:
/// - add a variant here
/// - record it from `Canvas`
/// - handle it in `backend::local::raster` and `backend::remote::protocol`
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Replace the whole style with this snapshot.
    ApplySettings(PaintState),
    SetColor(Color),
    SetAlpha(f32),
    SetStrokeWidth(f32),
    SetStrokeRound(bool),
    SetFont { size: f32, bold: bool, italic: bool },
    SetFontFamily(String),
    SetTextAlign(TextAlign),
    SetLineSpacing(f32),

    /// Wipe everything drawn so far in this frame.
    Clear,
    DrawRect(Rect),
    FillRect(Rect),
    DrawOval(Rect),
    FillOval(Rect),
    DrawArc { bounds: Rect, start: f32, extent: f32 },
    FillArc { bounds: Rect, start: f32, extent: f32 },
    DrawLine { from: Vec2, to: Vec2 },
    /// Open polyline.
    DrawPath(Vec<Vec2>),
    /// Closed outline.
    DrawPoly(Vec<Vec2>),
    FillPoly(Vec<Vec2>),
    DrawString { at: Vec2, text: String },
    DrawImage(ImageCmd),
}

impl DrawCmd {
    #[inline]
    pub fn is_style(&self) -> bool {
        matches!(
            self,
            DrawCmd::ApplySettings(_)
                | DrawCmd::SetColor(_)
                | DrawCmd::SetAlpha(_)
                | DrawCmd::SetStrokeWidth(_)
                | DrawCmd::SetStrokeRound(_)
                | DrawCmd::SetFont { .. }
                | DrawCmd::SetFontFamily(_)
                | DrawCmd::SetTextAlign(_)
                | DrawCmd::SetLineSpacing(_)
        )
    }

    /// Applies a style command to `state`. Returns `false` for non-style commands.
    ///
    /// Values were clamped when recorded, so they are stored verbatim here.
    pub fn apply_style(&self, state: &mut PaintState) -> bool {
        match self {
            DrawCmd::ApplySettings(s) => *state = s.clone(),
            DrawCmd::SetColor(c) => state.color = *c,
            DrawCmd::SetAlpha(a) => state.alpha = *a,
            DrawCmd::SetStrokeWidth(w) => state.stroke_width = *w,
            DrawCmd::SetStrokeRound(r) => state.stroke_round = *r,
            DrawCmd::SetFont { size, bold, italic } => {
                state.font_size = *size;
                state.bold = *bold;
                state.italic = *italic;
            }
            DrawCmd::SetFontFamily(f) => state.font_family.clone_from(f),
            DrawCmd::SetTextAlign(a) => state.align = *a,
            DrawCmd::SetLineSpacing(s) => state.line_spacing = *s,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_commands_mutate_state() {
        let mut s = PaintState::default();
        assert!(DrawCmd::SetColor(Color::rgb(255, 0, 0)).apply_style(&mut s));
        assert!(DrawCmd::SetFont { size: 30.0, bold: true, italic: true }.apply_style(&mut s));
        assert_eq!(s.color, Color::rgb(255, 0, 0));
        assert_eq!((s.font_size, s.bold, s.italic), (30.0, true, true));
    }

    #[test]
    fn geometry_commands_leave_state_alone() {
        let mut s = PaintState::default();
        let before = s.clone();
        assert!(!DrawCmd::FillRect(Rect::new(0.0, 0.0, 1.0, 1.0)).apply_style(&mut s));
        assert!(!DrawCmd::Clear.is_style());
        assert_eq!(s, before);
    }

    #[test]
    fn apply_settings_replaces_everything() {
        let mut target = PaintState::default();
        target.set_line_spacing(2.0);
        target.set_align(TextAlign::Center);

        let mut s = PaintState::default();
        s.set_color(Color::WHITE);
        DrawCmd::ApplySettings(target.clone()).apply_style(&mut s);
        assert_eq!(s, target);
    }
}
