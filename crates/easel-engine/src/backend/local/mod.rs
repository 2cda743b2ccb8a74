//! Native-window backend.
//!
//! The winit event loop owns the window and the GPU surface and must run on
//! the main thread; the user program runs on its own thread and talks to the
//! loop through an [`EventLoopProxy`]. Every redraw rasterizes the current
//! display buffer with `tiny-skia` and blits the result onto the surface.

mod blit;
mod font;
mod gpu;
mod images;
mod raster;
mod window;

pub use font::{FontFace, FontLoadError};
pub use gpu::{GpuInit, SurfaceErrorAction};
pub use images::ImageStore;
pub use raster::{Rasterizer, BACKGROUND};
pub use window::LocalApp;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use winit::event_loop::EventLoopProxy;

use crate::backend::{Backend, Capabilities, ImageInfo};
use crate::error::{Capability, EngineError, EngineResult};
use crate::paint::PaintState;
use crate::scene::SharedFrames;

pub const NAME: &str = "local";

/// Requests the program thread sends to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderRequest {
    /// The display buffer changed.
    Redraw,
    Resize { width: u32, height: u32 },
    SetTitle(String),
    Close,
    /// The program returned; the loop exits unless it lingers.
    ProgramFinished,
}

/// State both the backend and the event loop read.
#[derive(Debug)]
pub struct LocalShared {
    open: AtomicBool,
    size: Mutex<(u32, u32)>,
}

impl LocalShared {
    pub fn new(width: u32, height: u32) -> Self {
        Self { open: AtomicBool::new(true), size: Mutex::new((width, height)) }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }

    pub fn size(&self) -> (u32, u32) {
        *self.size.lock()
    }

    pub fn set_size(&self, width: u32, height: u32) {
        *self.size.lock() = (width, height);
    }
}

/// [`Backend`] half living on the program thread.
pub struct LocalBackend {
    proxy: EventLoopProxy<RenderRequest>,
    shared: Arc<LocalShared>,
    images: ImageStore,
    font: Option<Arc<FontFace>>,
}

impl LocalBackend {
    pub fn new(
        proxy: EventLoopProxy<RenderRequest>,
        shared: Arc<LocalShared>,
        images: ImageStore,
        font: Option<Arc<FontFace>>,
    ) -> Self {
        Self { proxy, shared, images, font }
    }

    /// Forwards `request`; a gone event loop means the window is gone too.
    fn send(&self, request: RenderRequest) {
        if self.proxy.send_event(request).is_err() {
            log::debug!("event loop closed; marking window closed");
            self.shared.mark_closed();
        }
    }
}

impl Backend for LocalBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { resize: true, measure_text: self.font.is_some(), font_family: false }
    }

    fn present(&mut self, _frames: &SharedFrames) -> EngineResult<()> {
        // The event loop reads `display()` itself when it handles the redraw.
        if self.shared.is_open() {
            self.send(RenderRequest::Redraw);
        }
        Ok(())
    }

    fn load_image(&mut self, path: &str) -> EngineResult<ImageInfo> {
        self.images.load(path)
    }

    fn measure_text(&mut self, text: &str, state: &PaintState) -> EngineResult<f32> {
        let font = self.font.as_ref().ok_or(EngineError::unsupported(NAME, Capability::MeasureText))?;
        Ok(font.measure(text, state.font_size))
    }

    fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
        if width == 0 || height == 0 {
            return Err(EngineError::Configuration(format!("invalid surface size {width}x{height}")));
        }
        self.shared.set_size(width, height);
        self.send(RenderRequest::Resize { width, height });
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> EngineResult<()> {
        self.send(RenderRequest::SetTitle(title.to_string()));
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        self.shared.size()
    }

    fn is_open(&self) -> bool {
        self.shared.is_open()
    }

    fn close(&mut self) {
        self.send(RenderRequest::Close);
        self.shared.mark_closed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_state_starts_open() {
        let shared = LocalShared::new(320, 200);
        assert!(shared.is_open());
        assert_eq!(shared.size(), (320, 200));

        shared.set_size(640, 400);
        shared.mark_closed();
        assert!(!shared.is_open());
        assert_eq!(shared.size(), (640, 400));
    }
}
