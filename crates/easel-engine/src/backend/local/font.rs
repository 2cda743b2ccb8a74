use std::fmt;
use std::path::{Path, PathBuf};

/// Error returned by [`FontFace::load`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("font load error: {0}")]
pub struct FontLoadError(pub String);

/// The single face the local backend draws and measures text with.
///
/// Immutable after loading, so the caller thread (measuring) and the render
/// thread (rasterizing) share one instance.
pub struct FontFace {
    font: fontdue::Font,
    source: PathBuf,
}

impl FontFace {
    /// Parses a TrueType or OpenType font from raw bytes.
    pub fn from_bytes(bytes: &[u8], source: impl Into<PathBuf>) -> Result<Self, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        Ok(Self { font, source: source.into() })
    }

    /// Loads the first readable, parseable font among `candidates`.
    pub fn load(candidates: &[PathBuf]) -> Result<Self, FontLoadError> {
        for path in candidates {
            let Ok(bytes) = std::fs::read(path) else { continue };
            match Self::from_bytes(&bytes, path) {
                Ok(face) => return Ok(face),
                Err(e) => log::debug!("skipping font {}: {e}", path.display()),
            }
        }
        Err(FontLoadError(format!("none of {} candidate fonts could be loaded", candidates.len())))
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    #[inline]
    pub(crate) fn font(&self) -> &fontdue::Font {
        &self.font
    }

    /// Pen advance of one line, kerning included.
    pub fn line_width(&self, line: &str, size: f32) -> f32 {
        let mut width = 0.0;
        let mut prev: Option<char> = None;
        for ch in line.chars() {
            if let Some(p) = prev {
                width += self.font.horizontal_kern(p, ch, size).unwrap_or(0.0);
            }
            width += self.font.metrics(ch, size).advance_width;
            prev = Some(ch);
        }
        width
    }

    /// Width of the longest line of `text`.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        text.split('\n').map(|l| self.line_width(l, size)).fold(0.0, f32::max)
    }

    /// Distance between consecutive baselines at `size`, before line spacing.
    pub fn line_height(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map(|m| m.new_line_size)
            .unwrap_or(size * 1.2)
    }
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace").field("source", &self.source).finish()
    }
}
