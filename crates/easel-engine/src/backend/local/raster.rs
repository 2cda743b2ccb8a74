use std::collections::HashMap;
use std::sync::Arc;

use tiny_skia::{
    FillRule, FilterQuality, IntSize, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint,
    Stroke, Transform,
};

use crate::coords::{Rect, Vec2};
use crate::paint::{Color, PaintState};
use crate::scene::{CommandBuffer, DrawCmd, ImageCmd};

use super::font::FontFace;
use super::images::ImageStore;

/// Color the surface is wiped to at the start of every pass and on `Clear`.
pub const BACKGROUND: Color = Color::WHITE;

/// Horizontal shear applied to synthesized italics.
const ITALIC_SKEW: f32 = -0.21;

/// Rasterized glyphs kept before the cache starts over.
const GLYPH_CACHE_LIMIT: usize = 2048;

/// Replays command buffers onto a `tiny-skia` pixmap.
///
/// Every pass starts from a default [`PaintState`] and a wiped surface, so
/// replaying the same buffer twice yields identical pixels. Coordinates are
/// logical; `scale` maps them to the pixmap's physical pixels.
pub struct Rasterizer {
    font: Option<Arc<FontFace>>,
    images: ImageStore,
    glyphs: GlyphCache,
}

struct Glyph {
    metrics: fontdue::Metrics,
    coverage: Vec<u8>,
}

/// Glyph bitmaps keyed by character and physical size.
///
/// Bounded: once `limit` entries exist, the next miss empties it first.
struct GlyphCache {
    entries: HashMap<(char, u32), Glyph>,
    limit: usize,
}

impl GlyphCache {
    fn new(limit: usize) -> Self {
        Self { entries: HashMap::new(), limit }
    }

    fn get_or_insert_with(&mut self, ch: char, size: f32, rasterize: impl FnOnce() -> Glyph) -> &Glyph {
        let key = (ch, size.to_bits());
        if self.entries.len() >= self.limit && !self.entries.contains_key(&key) {
            self.entries.clear();
        }
        self.entries.entry(key).or_insert_with(rasterize)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Rasterizer {
    pub fn new(font: Option<Arc<FontFace>>, images: ImageStore) -> Self {
        Self { font, images, glyphs: GlyphCache::new(GLYPH_CACHE_LIMIT) }
    }

    /// Draws `buffer` into `pixmap`, replacing its previous contents.
    pub fn render(&mut self, buffer: &CommandBuffer, pixmap: &mut Pixmap, scale: f32) {
        let base = Transform::from_scale(scale, scale);
        let mut state = PaintState::default();
        pixmap.fill(to_skia(BACKGROUND));

        for cmd in buffer {
            if cmd.apply_style(&mut state) {
                continue;
            }
            self.execute(cmd, &state, pixmap, base, scale);
        }
    }

    fn execute(&mut self, cmd: &DrawCmd, state: &PaintState, pixmap: &mut Pixmap, base: Transform, scale: f32) {
        let paint = solid(state);

        match cmd {
            DrawCmd::Clear => pixmap.fill(to_skia(BACKGROUND)),

            DrawCmd::DrawRect(r) => {
                if let Some(path) = rect_path(*r) {
                    pixmap.stroke_path(&path, &paint, &stroke(state), base, None);
                }
            }
            DrawCmd::FillRect(r) => {
                if let Some(path) = rect_path(*r) {
                    pixmap.fill_path(&path, &paint, FillRule::Winding, base, None);
                }
            }
            DrawCmd::DrawOval(r) => {
                if let Some(path) = oval_path(*r) {
                    pixmap.stroke_path(&path, &paint, &stroke(state), base, None);
                }
            }
            DrawCmd::FillOval(r) => {
                if let Some(path) = oval_path(*r) {
                    pixmap.fill_path(&path, &paint, FillRule::Winding, base, None);
                }
            }
            DrawCmd::DrawArc { bounds, start, extent } => {
                if let Some(path) = arc_path(*bounds, *start, *extent, false) {
                    pixmap.stroke_path(&path, &paint, &stroke(state), base, None);
                }
            }
            DrawCmd::FillArc { bounds, start, extent } => {
                if let Some(path) = arc_path(*bounds, *start, *extent, true) {
                    pixmap.fill_path(&path, &paint, FillRule::Winding, base, None);
                }
            }
            DrawCmd::DrawLine { from, to } => {
                if let Some(path) = poly_path(&[*from, *to], false) {
                    pixmap.stroke_path(&path, &paint, &stroke(state), base, None);
                }
            }
            DrawCmd::DrawPath(points) => {
                if let Some(path) = poly_path(points, false) {
                    pixmap.stroke_path(&path, &paint, &stroke(state), base, None);
                }
            }
            DrawCmd::DrawPoly(points) => {
                if let Some(path) = poly_path(points, true) {
                    pixmap.stroke_path(&path, &paint, &stroke(state), base, None);
                }
            }
            DrawCmd::FillPoly(points) => {
                if let Some(path) = poly_path(points, true) {
                    pixmap.fill_path(&path, &paint, FillRule::EvenOdd, base, None);
                }
            }
            DrawCmd::DrawString { at, text } => self.draw_text(*at, text, state, pixmap, scale),
            DrawCmd::DrawImage(img) => self.draw_image(img, state, pixmap, base),

            // Style commands are consumed by `render`.
            _ => {}
        }
    }

    // ── text ──────────────────────────────────────────────────────────────

    fn draw_text(&mut self, at: Vec2, text: &str, state: &PaintState, pixmap: &mut Pixmap, scale: f32) {
        let Some(font) = self.font.clone() else {
            log::debug!("no font face loaded; text skipped");
            return;
        };

        let logical_size = state.font_size.min(4096.0);
        if logical_size <= 0.0 {
            return;
        }
        let phys_size = logical_size * scale;
        let line_step = font.line_height(logical_size) * state.line_spacing.min(1.0e4);
        let color = state.effective_color();
        let skew = if state.italic { ITALIC_SKEW } else { 0.0 };
        let passes = if state.bold { 2 } else { 1 };
        let bold_dx = (phys_size / 24.0).max(1.0);

        for (i, line) in text.split('\n').enumerate() {
            let width = font.line_width(line, logical_size);
            let mut pen = (at.x + state.align.offset(width)) * scale;
            let baseline = (at.y + i as f32 * line_step) * scale;
            let mut prev: Option<char> = None;

            for ch in line.chars() {
                if let Some(p) = prev {
                    pen += font.font().horizontal_kern(p, ch, phys_size).unwrap_or(0.0);
                }
                prev = Some(ch);

                let glyph = self.glyph(&font, ch, phys_size);
                let advance = glyph.metrics.advance_width;
                if let Some(tile) = glyph_tile(glyph, color) {
                    let m = glyph.metrics;
                    let top = -(m.height as f32 + m.ymin as f32);
                    for pass in 0..passes {
                        let transform = Transform::from_translate(pen + pass as f32 * bold_dx, baseline)
                            .pre_concat(Transform::from_row(1.0, 0.0, skew, 1.0, 0.0, 0.0))
                            .pre_translate(m.xmin as f32, top);
                        pixmap.draw_pixmap(0, 0, tile.as_ref(), &PixmapPaint::default(), transform, None);
                    }
                }
                pen += advance;
            }
        }
    }

    fn glyph(&mut self, font: &FontFace, ch: char, size: f32) -> &Glyph {
        self.glyphs.get_or_insert_with(ch, size, || {
            let (metrics, coverage) = font.font().rasterize(ch, size);
            Glyph { metrics, coverage }
        })
    }

    // ── images ────────────────────────────────────────────────────────────

    fn draw_image(&self, img: &ImageCmd, state: &PaintState, pixmap: &mut Pixmap, base: Transform) {
        let Some(src) = self.images.get(&img.path) else {
            log::warn!("image `{}` was never loaded; skipped", img.path);
            return;
        };

        let (w, h) = (src.width() as f32, src.height() as f32);
        let center = if img.centered {
            img.at
        } else {
            Vec2::new(img.at.x + w * img.scale * 0.5, img.at.y + h * img.scale * 0.5)
        };

        // Rotation pivots on the image center in both placements.
        let transform = base
            .pre_translate(center.x, center.y)
            .pre_rotate(img.angle)
            .pre_scale(img.scale, img.scale)
            .pre_translate(-w * 0.5, -h * 0.5);

        let paint = PixmapPaint {
            opacity: state.alpha,
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        pixmap.draw_pixmap(0, 0, Pixmap::as_ref(&src), &paint, transform, None);
    }
}

// ── helpers ───────────────────────────────────────────────────────────────

fn to_skia(c: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn solid(state: &PaintState) -> Paint<'static> {
    let c = state.effective_color();
    let mut paint = Paint::default();
    paint.set_color_rgba8(c.r, c.g, c.b, c.a);
    paint.anti_alias = true;
    paint
}

fn stroke(state: &PaintState) -> Stroke {
    let (line_cap, line_join) = if state.stroke_round {
        (LineCap::Round, LineJoin::Round)
    } else {
        (LineCap::Square, LineJoin::Miter)
    };
    Stroke {
        width: state.stroke_width.min(1.0e6),
        line_cap,
        line_join,
        ..Stroke::default()
    }
}

fn skia_rect(r: Rect) -> Option<tiny_skia::Rect> {
    let r = r.normalized();
    tiny_skia::Rect::from_xywh(r.x, r.y, r.width, r.height)
}

fn rect_path(r: Rect) -> Option<Path> {
    skia_rect(r).map(PathBuilder::from_rect)
}

fn oval_path(r: Rect) -> Option<Path> {
    skia_rect(r).and_then(PathBuilder::from_oval)
}

/// Elliptical arc inscribed in `bounds`; angles in degrees, counter-clockwise
/// from three o'clock. A `pie` closes through the center.
fn arc_path(bounds: Rect, start: f32, extent: f32, pie: bool) -> Option<Path> {
    let r = bounds.normalized();
    if !start.is_finite() || !extent.is_finite() || extent == 0.0 {
        return None;
    }
    let extent = extent.clamp(-360.0, 360.0);
    let (cx, cy) = (r.x + r.width * 0.5, r.y + r.height * 0.5);
    let (rx, ry) = (r.width * 0.5, r.height * 0.5);
    let steps = ((extent.abs() / 4.0).ceil() as usize).max(8);

    let point = |i: usize| {
        let a = (start + extent * i as f32 / steps as f32).to_radians();
        (cx + rx * a.cos(), cy - ry * a.sin())
    };

    let mut pb = PathBuilder::new();
    if pie {
        pb.move_to(cx, cy);
        let (x, y) = point(0);
        pb.line_to(x, y);
    } else {
        let (x, y) = point(0);
        pb.move_to(x, y);
    }
    for i in 1..=steps {
        let (x, y) = point(i);
        pb.line_to(x, y);
    }
    if pie {
        pb.close();
    }
    pb.finish()
}

fn poly_path(points: &[Vec2], close: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

/// Tints a coverage bitmap with `color` as a premultiplied pixmap.
fn glyph_tile(glyph: &Glyph, color: Color) -> Option<Pixmap> {
    let size = IntSize::from_wh(glyph.metrics.width as u32, glyph.metrics.height as u32)?;
    let mut data = Vec::with_capacity(glyph.coverage.len() * 4);
    for &cov in &glyph.coverage {
        let a = (color.a as u16 * cov as u16 + 127) / 255;
        let premul = |c: u8| ((c as u16 * a + 127) / 255) as u8;
        data.extend_from_slice(&[premul(color.r), premul(color.g), premul(color.b), a as u8]);
    }
    Pixmap::from_vec(data, size)
}
