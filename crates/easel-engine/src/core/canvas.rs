use crate::backend::{Backend, Capabilities, ImageInfo};
use crate::coords::{Rect, Vec2};
use crate::error::{Capability, EngineResult};
use crate::paint::{Color, PaintState, TextAlign};
use crate::scene::{CommandBuffer, DrawCmd, ImageCmd, SharedFrames, SwapMode};

use std::sync::Arc;

/// The drawing surface handed to user code and to `Drawable` components.
///
/// Every call records a command into the live buffer; nothing is rendered
/// until the engine delivers a frame. Style setters clamp their input, store
/// it in the current [`PaintState`] and record exactly the stored value.
pub struct Canvas {
    state: PaintState,
    frames: SharedFrames,
    backend: Box<dyn Backend>,
}

impl Canvas {
    pub fn new(backend: Box<dyn Backend>, frames: SharedFrames) -> Self {
        Self { state: PaintState::default(), frames, backend }
    }

    #[inline]
    fn record(&self, cmd: DrawCmd) {
        self.frames.record(cmd);
    }

    // ── Settings ──────────────────────────────────────────────────────────

    /// Current style.
    #[inline]
    pub fn settings(&self) -> &PaintState {
        &self.state
    }

    /// Sets an opaque color; channels outside `[0, 255]` saturate.
    pub fn set_color(&mut self, r: i32, g: i32, b: i32) {
        self.set_color_rgba(r, g, b, 255);
    }

    pub fn set_color_rgba(&mut self, r: i32, g: i32, b: i32, a: i32) {
        self.set_paint_color(Color::clamped(r, g, b, a));
    }

    pub fn set_paint_color(&mut self, color: Color) {
        let c = self.state.set_color(color);
        self.record(DrawCmd::SetColor(c));
    }

    /// Global opacity in `[0, 1]`, multiplied into every color.
    pub fn set_alpha(&mut self, alpha: f32) {
        let a = self.state.set_alpha(alpha);
        self.record(DrawCmd::SetAlpha(a));
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        let w = self.state.set_stroke_width(width);
        self.record(DrawCmd::SetStrokeWidth(w));
    }

    /// Round stroke caps and joins when `true`.
    pub fn set_stroke_round(&mut self, round: bool) {
        let r = self.state.set_stroke_round(round);
        self.record(DrawCmd::SetStrokeRound(r));
    }

    pub fn set_font(&mut self, size: f32, bold: bool, italic: bool) {
        let (size, bold, italic) = self.state.set_font(size, bold, italic);
        self.record(DrawCmd::SetFont { size, bold, italic });
    }

    pub fn set_font_size(&mut self, size: f32) {
        let (bold, italic) = (self.state.bold, self.state.italic);
        self.set_font(size, bold, italic);
    }

    /// Changes the font family. Backends with a single bundled face refuse.
    pub fn set_font_family(&mut self, family: &str) -> EngineResult<()> {
        self.require(Capability::FontFamily)?;
        self.state.set_font_family(family);
        self.record(DrawCmd::SetFontFamily(family.to_string()));
        Ok(())
    }

    pub fn set_text_align(&mut self, align: TextAlign) {
        let a = self.state.set_align(align);
        self.record(DrawCmd::SetTextAlign(a));
    }

    /// Line height multiplier for multi-line strings.
    pub fn set_line_spacing(&mut self, spacing: f32) {
        let s = self.state.set_line_spacing(spacing);
        self.record(DrawCmd::SetLineSpacing(s));
    }

    /// Restores every setting to its default.
    pub fn reset_settings(&mut self) {
        self.state.reset();
        self.record(DrawCmd::ApplySettings(self.state.clone()));
    }

    /// Installs a previously saved style wholesale.
    pub fn restore_settings(&mut self, saved: PaintState) {
        self.record(DrawCmd::ApplySettings(saved.clone()));
        self.state = saved;
    }

    // ── Drawing ───────────────────────────────────────────────────────────

    /// Wipes everything drawn so far in the current frame.
    pub fn clear(&mut self) {
        self.record(DrawCmd::Clear);
    }

    pub fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.record(DrawCmd::DrawRect(Rect::new(x, y, w, h)));
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.record(DrawCmd::FillRect(Rect::new(x, y, w, h)));
    }

    /// Outlines the ellipse inscribed in the given box.
    pub fn draw_oval(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.record(DrawCmd::DrawOval(Rect::new(x, y, w, h)));
    }

    pub fn fill_oval(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.record(DrawCmd::FillOval(Rect::new(x, y, w, h)));
    }

    /// Outlines an elliptical arc. Angles are in degrees, counter-clockwise
    /// from three o'clock.
    pub fn draw_arc(&mut self, x: f32, y: f32, w: f32, h: f32, start: f32, extent: f32) {
        let bounds = Rect::new(x, y, w, h);
        self.record(DrawCmd::DrawArc { bounds, start, extent });
    }

    /// Fills a pie slice.
    pub fn fill_arc(&mut self, x: f32, y: f32, w: f32, h: f32, start: f32, extent: f32) {
        let bounds = Rect::new(x, y, w, h);
        self.record(DrawCmd::FillArc { bounds, start, extent });
    }

    pub fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.record(DrawCmd::DrawLine { from: Vec2::new(x1, y1), to: Vec2::new(x2, y2) });
    }

    /// Open polyline through `points`.
    pub fn draw_path<P: Into<Vec2>>(&mut self, points: impl IntoIterator<Item = P>) {
        self.record(DrawCmd::DrawPath(collect_points(points)));
    }

    /// Closed outline through `points`.
    pub fn draw_polygon<P: Into<Vec2>>(&mut self, points: impl IntoIterator<Item = P>) {
        self.record(DrawCmd::DrawPoly(collect_points(points)));
    }

    pub fn fill_polygon<P: Into<Vec2>>(&mut self, points: impl IntoIterator<Item = P>) {
        self.record(DrawCmd::FillPoly(collect_points(points)));
    }

    /// Draws `text` with its baseline at `y`, anchored at `x` per the current
    /// alignment. Newlines start a new line.
    pub fn draw_string(&mut self, text: impl Into<String>, x: f32, y: f32) {
        self.record(DrawCmd::DrawString { at: Vec2::new(x, y), text: text.into() });
    }

    /// Draws the image at `path` with its top-left corner at `(x, y)`,
    /// scaled, then rotated by `angle` degrees clockwise.
    ///
    /// The image is loaded on first use; a missing or corrupt file fails this
    /// call and records nothing.
    pub fn draw_image(&mut self, path: &str, x: f32, y: f32, scale: f32, angle: f32) -> EngineResult<()> {
        self.push_image(path, x, y, scale, angle, false)
    }

    /// Like [`draw_image`](Self::draw_image) with `(x, y)` as the image center.
    pub fn draw_image_centered(&mut self, path: &str, x: f32, y: f32, scale: f32, angle: f32) -> EngineResult<()> {
        self.push_image(path, x, y, scale, angle, true)
    }

    fn push_image(&mut self, path: &str, x: f32, y: f32, scale: f32, angle: f32, centered: bool) -> EngineResult<()> {
        self.backend.load_image(path)?;
        self.record(DrawCmd::DrawImage(ImageCmd {
            at: Vec2::new(x, y),
            scale,
            angle,
            path: path.to_string(),
            centered,
        }));
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Pixel size of the image at `path`, loading it if needed.
    pub fn image_size(&mut self, path: &str) -> EngineResult<ImageInfo> {
        self.backend.load_image(path)
    }

    /// Width of `text` (longest line) under the current font settings.
    pub fn string_width(&mut self, text: &str) -> EngineResult<f32> {
        self.require(Capability::MeasureText)?;
        self.backend.measure_text(text, &self.state)
    }

    pub fn width(&self) -> u32 {
        self.backend.size().0
    }

    pub fn height(&self) -> u32 {
        self.backend.size().1
    }

    pub fn capabilities(&self) -> Capabilities {
        self.backend.capabilities()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    // ── Surface ───────────────────────────────────────────────────────────

    pub fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
        self.require(Capability::Resize)?;
        self.backend.resize(width, height)
    }

    pub fn set_title(&mut self, title: &str) -> EngineResult<()> {
        self.backend.set_title(title)
    }

    pub fn is_open(&self) -> bool {
        self.backend.is_open()
    }

    pub fn close(&mut self) {
        self.backend.close();
    }

    // ── Frame plumbing (engine only) ──────────────────────────────────────

    /// Swaps the frame pair, seeding a fresh live buffer from the current style.
    pub(crate) fn swap(&mut self, mode: SwapMode) -> Arc<CommandBuffer> {
        self.frames.swap(mode, &self.state)
    }

    pub(crate) fn present(&mut self) -> EngineResult<()> {
        self.backend.present(&self.frames)
    }

    #[inline]
    fn require(&self, capability: Capability) -> EngineResult<()> {
        self.backend.capabilities().require(self.backend.name(), capability)
    }
}

fn collect_points<P: Into<Vec2>>(points: impl IntoIterator<Item = P>) -> Vec<Vec2> {
    points.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::TestBackend;
    use crate::error::EngineError;

    fn canvas_with(backend: TestBackend) -> (Canvas, SharedFrames) {
        let frames = SharedFrames::new(&PaintState::default());
        (Canvas::new(Box::new(backend), frames.clone()), frames)
    }

    fn canvas() -> (Canvas, SharedFrames) {
        canvas_with(TestBackend::new().0)
    }

    fn live(canvas: &mut Canvas) -> Arc<CommandBuffer> {
        canvas.swap(SwapMode::Accumulate)
    }

    #[test]
    fn color_is_clamped_before_recording() {
        let (mut c, _) = canvas();
        c.set_color(300, -10, 0);
        assert_eq!(c.settings().color, Color::rgb(255, 0, 0));
        let buf = live(&mut c);
        assert_eq!(buf.commands().last(), Some(&DrawCmd::SetColor(Color::rgb(255, 0, 0))));
    }

    #[test]
    fn geometry_records_operands_only() {
        let (mut c, _) = canvas();
        c.set_stroke_width(f32::INFINITY);
        c.draw_rect(1.0, 2.0, 3.0, 4.0);
        let buf = live(&mut c);
        assert_eq!(buf.commands().last(), Some(&DrawCmd::DrawRect(Rect::new(1.0, 2.0, 3.0, 4.0))));
        assert_eq!(buf.replay_style().stroke_width, f32::MAX);
    }

    #[test]
    fn replaying_reproduces_final_settings() {
        let (mut c, _) = canvas();
        c.set_color_rgba(10, 20, 30, 40);
        c.fill_oval(0.0, 0.0, 5.0, 5.0);
        c.set_font(22.0, true, true);
        c.set_text_align(TextAlign::Right);
        c.draw_string("hi", 3.0, 3.0);
        c.set_alpha(0.25);
        let buf = live(&mut c);
        assert_eq!(&buf.replay_style(), c.settings());
        assert_eq!(buf.replay_style(), buf.replay_style());
    }

    #[test]
    fn reset_records_apply_settings() {
        let (mut c, _) = canvas();
        c.set_line_spacing(3.0);
        c.reset_settings();
        assert_eq!(c.settings(), &PaintState::default());
        let buf = live(&mut c);
        assert_eq!(buf.commands().last(), Some(&DrawCmd::ApplySettings(PaintState::default())));
    }

    #[test]
    fn unsupported_capabilities_fail_without_mutation() {
        let (mut backend, _) = TestBackend::new();
        backend.caps = Capabilities { resize: false, measure_text: false, font_family: false };
        let (mut c, frames) = canvas_with(backend);
        let before = frames.live_len();

        let err = c.set_font_family("serif").unwrap_err();
        assert!(matches!(err, EngineError::Unsupported { capability: Capability::FontFamily, .. }));
        assert_eq!(c.settings().font_family, "sans-serif");
        assert!(c.string_width("abc").is_err());
        assert!(c.resize(10, 10).is_err());
        assert_eq!(frames.live_len(), before);
    }

    #[test]
    fn missing_image_records_nothing() {
        let (mut backend, _) = TestBackend::new();
        backend.images.insert("cat.png".into(), ImageInfo { width: 4, height: 2 });
        let (mut c, frames) = canvas_with(backend);

        let err = c.draw_image("dog.png", 0.0, 0.0, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, EngineError::ResourceLoad { .. }));
        assert_eq!(frames.live_len(), 1);

        c.draw_image_centered("cat.png", 5.0, 5.0, 2.0, 90.0).unwrap();
        assert_eq!(c.image_size("cat.png").unwrap(), ImageInfo { width: 4, height: 2 });
        assert_eq!(live(&mut c).image_paths(), vec!["cat.png"]);
    }

    #[test]
    fn polylines_accept_tuples() {
        let (mut c, _) = canvas();
        c.draw_path([(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let buf = live(&mut c);
        let Some(DrawCmd::DrawPath(points)) = buf.commands().last() else {
            panic!("expected a path");
        };
        assert_eq!(points.len(), 3);
        assert_eq!(points[1], Vec2::new(1.0, 1.0));
    }
}
