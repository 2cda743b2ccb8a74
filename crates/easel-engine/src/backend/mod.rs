//! Renderer backends.
//!
//! A backend turns the display buffer into something visible and feeds raw
//! platform or socket events into the shared [`InputTracker`](crate::input::InputTracker).
//!
//! - [`local`]: native window, software rasterization, GPU blit
//! - [`remote`]: browser page driven over a websocket line protocol

pub mod local;
pub mod remote;

use crate::error::{Capability, EngineError, EngineResult};
use crate::paint::PaintState;
use crate::scene::SharedFrames;

/// Optional features a backend declares up front.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Capabilities {
    pub resize: bool,
    pub measure_text: bool,
    pub font_family: bool,
}

impl Capabilities {
    #[inline]
    pub fn supports(self, capability: Capability) -> bool {
        match capability {
            Capability::Resize => self.resize,
            Capability::MeasureText => self.measure_text,
            Capability::FontFamily => self.font_family,
        }
    }

    /// Fails with [`EngineError::Unsupported`] when `capability` is missing.
    pub fn require(self, backend: &'static str, capability: Capability) -> EngineResult<()> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(EngineError::unsupported(backend, capability))
        }
    }
}

/// Pixel dimensions of a loaded image.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// The renderer half of an engine.
///
/// Implementations are moved to the thread running the user program; anything
/// they share with their own event-producer thread must be synchronized.
pub trait Backend: Send {
    /// Short name used in logs and capability errors.
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Makes the display buffer of `frames` visible.
    ///
    /// Called once per delivery, after the swap.
    fn present(&mut self, frames: &SharedFrames) -> EngineResult<()>;

    /// Loads (or finds cached) the image at `path`.
    fn load_image(&mut self, path: &str) -> EngineResult<ImageInfo>;

    /// Width of `text` when drawn with `state`.
    fn measure_text(&mut self, _text: &str, _state: &PaintState) -> EngineResult<f32> {
        Err(EngineError::unsupported(self.name(), Capability::MeasureText))
    }

    fn resize(&mut self, _width: u32, _height: u32) -> EngineResult<()> {
        Err(EngineError::unsupported(self.name(), Capability::Resize))
    }

    fn set_title(&mut self, title: &str) -> EngineResult<()>;

    /// Current drawing surface size in logical pixels.
    fn size(&self) -> (u32, u32);

    /// Cooperative open flag; flips to `false` once the window or connection goes away.
    fn is_open(&self) -> bool;

    fn close(&mut self);
}

/// Recording backend for unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::scene::CommandBuffer;

    pub(crate) type Presented = Arc<Mutex<Vec<Arc<CommandBuffer>>>>;

    pub(crate) struct TestBackend {
        pub presented: Presented,
        pub caps: Capabilities,
        pub images: HashMap<String, ImageInfo>,
        pub open: bool,
        pub size: (u32, u32),
    }

    impl TestBackend {
        /// Creates a backend plus a handle to everything it will present.
        pub fn new() -> (Self, Presented) {
            let presented = Presented::default();
            let backend = Self {
                presented: Arc::clone(&presented),
                caps: Capabilities { resize: true, measure_text: true, font_family: true },
                images: HashMap::new(),
                open: true,
                size: (800, 600),
            };
            (backend, presented)
        }
    }

    impl Backend for TestBackend {
        fn name(&self) -> &'static str {
            "test"
        }

        fn capabilities(&self) -> Capabilities {
            self.caps
        }

        fn present(&mut self, frames: &SharedFrames) -> EngineResult<()> {
            self.presented.lock().push(frames.display());
            Ok(())
        }

        fn load_image(&mut self, path: &str) -> EngineResult<ImageInfo> {
            self.images
                .get(path)
                .copied()
                .ok_or_else(|| EngineError::resource(path, "not found"))
        }

        fn measure_text(&mut self, text: &str, state: &PaintState) -> EngineResult<f32> {
            Ok(text.chars().count() as f32 * state.font_size * 0.5)
        }

        fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
            self.size = (width, height);
            Ok(())
        }

        fn set_title(&mut self, _title: &str) -> EngineResult<()> {
            Ok(())
        }

        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn is_open(&self) -> bool {
            self.open
        }

        fn close(&mut self) {
            self.open = false;
        }
    }
}
