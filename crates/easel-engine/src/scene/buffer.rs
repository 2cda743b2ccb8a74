use crate::paint::PaintState;

use super::DrawCmd;

/// Ordered, append-only display list for one not-yet-shown frame.
///
/// Performance characteristics:
/// - `push()` is O(1) amortized
/// - cloning copies every command (accumulate mode pays this once per delivery)
///
/// A buffer built with [`CommandBuffer::seeded`] starts with an
/// `ApplySettings` command, so replaying it from a default context begins from
/// the style that was current when the buffer was created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandBuffer {
    cmds: Vec<DrawCmd>,
}

impl CommandBuffer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer whose first command restores `state`.
    pub fn seeded(state: &PaintState) -> Self {
        Self { cmds: vec![DrawCmd::ApplySettings(state.clone())] }
    }

    #[inline]
    pub fn push(&mut self, cmd: DrawCmd) {
        self.cmds.push(cmd);
    }

    /// Commands in issue order.
    #[inline]
    pub fn commands(&self) -> &[DrawCmd] {
        &self.cmds
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, DrawCmd> {
        self.cmds.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Non-style commands in issue order.
    pub fn drawing(&self) -> impl Iterator<Item = &DrawCmd> {
        self.cmds.iter().filter(|c| !c.is_style())
    }

    /// Style reached by replaying every style command over a default context.
    pub fn replay_style(&self) -> PaintState {
        let mut state = PaintState::default();
        for cmd in &self.cmds {
            cmd.apply_style(&mut state);
        }
        state
    }

    /// Distinct image paths referenced by this buffer, in first-use order.
    pub fn image_paths(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for cmd in &self.cmds {
            if let DrawCmd::DrawImage(img) = cmd {
                if !out.contains(&img.path.as_str()) {
                    out.push(&img.path);
                }
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a CommandBuffer {
    type Item = &'a DrawCmd;
    type IntoIter = std::slice::Iter<'a, DrawCmd>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, Vec2};
    use crate::paint::{Color, TextAlign};
    use crate::scene::ImageCmd;

    #[test]
    fn seeded_buffer_starts_from_given_style() {
        let mut state = PaintState::default();
        state.set_color(Color::rgb(0, 128, 0));
        let buf = CommandBuffer::seeded(&state);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.replay_style(), state);
    }

    #[test]
    fn replay_is_idempotent() {
        let mut buf = CommandBuffer::seeded(&PaintState::default());
        buf.push(DrawCmd::SetColor(Color::rgb(9, 9, 9)));
        buf.push(DrawCmd::FillRect(Rect::new(0.0, 0.0, 4.0, 4.0)));
        buf.push(DrawCmd::SetTextAlign(TextAlign::Center));
        buf.push(DrawCmd::SetStrokeWidth(3.0));

        let first = buf.replay_style();
        let second = buf.replay_style();
        assert_eq!(first, second);
        assert_eq!(first.color, Color::rgb(9, 9, 9));
        assert_eq!(first.align, TextAlign::Center);
        assert_eq!(buf.drawing().count(), 1);
    }

    #[test]
    fn image_paths_are_deduplicated() {
        let img = |p: &str| {
            DrawCmd::DrawImage(ImageCmd {
                at: Vec2::zero(),
                scale: 1.0,
                angle: 0.0,
                path: p.to_string(),
                centered: false,
            })
        };
        let mut buf = CommandBuffer::new();
        buf.push(img("a.png"));
        buf.push(img("b.png"));
        buf.push(img("a.png"));
        assert_eq!(buf.image_paths(), vec!["a.png", "b.png"]);
    }
}
