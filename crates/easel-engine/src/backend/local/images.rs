use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tiny_skia::{IntSize, Pixmap};

use crate::backend::ImageInfo;
use crate::error::{EngineError, EngineResult};

/// Decoded images keyed by the path they were loaded from.
///
/// The caller thread loads (so failures surface from the draw call that
/// triggered them); the render thread only reads.
#[derive(Debug, Clone, Default)]
pub struct ImageStore {
    images: Arc<Mutex<HashMap<String, Arc<Pixmap>>>>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `path` on first use and returns its dimensions.
    pub fn load(&self, path: &str) -> EngineResult<ImageInfo> {
        if let Some(p) = self.images.lock().get(path) {
            return Ok(ImageInfo { width: p.width(), height: p.height() });
        }

        let decoded = image::open(path).map_err(|e| EngineError::resource(path, e))?;
        let pixmap = to_pixmap(decoded.into_rgba8()).ok_or_else(|| EngineError::resource(path, "image is empty"))?;
        let info = ImageInfo { width: pixmap.width(), height: pixmap.height() };

        log::debug!("image loaded: {path} ({}x{})", info.width, info.height);
        self.images.lock().insert(path.to_string(), Arc::new(pixmap));
        Ok(info)
    }

    pub fn get(&self, path: &str) -> Option<Arc<Pixmap>> {
        self.images.lock().get(path).cloned()
    }

    #[cfg(test)]
    pub(crate) fn insert(&self, path: &str, pixmap: Pixmap) {
        self.images.lock().insert(path.to_string(), Arc::new(pixmap));
    }
}

/// Converts straight RGBA into tiny-skia's premultiplied layout.
fn to_pixmap(rgba: image::RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(rgba.width(), rgba.height())?;
    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_resource_error() {
        let store = ImageStore::new();
        let err = store.load("/nonexistent/cat.png").unwrap_err();
        assert!(matches!(err, EngineError::ResourceLoad { ref path, .. } if path == "/nonexistent/cat.png"));
    }

    #[test]
    fn premultiplies_on_conversion() {
        let img = image::RgbaImage::from_raw(1, 1, vec![200, 100, 50, 128]).unwrap();
        let pixmap = to_pixmap(img).unwrap();
        let px = pixmap.pixel(0, 0).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (100, 50, 25, 128));
    }

    #[test]
    fn decodes_and_caches_png() {
        let dir = std::env::temp_dir().join(format!("easel-images-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dot.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([0, 0, 255, 255])).save(&path).unwrap();

        let store = ImageStore::new();
        let path = path.to_string_lossy().into_owned();
        assert_eq!(store.load(&path).unwrap(), ImageInfo { width: 3, height: 2 });
        assert!(store.get(&path).is_some());

        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(store.load(&path).unwrap(), ImageInfo { width: 3, height: 2 }, "served from cache");
    }
}
