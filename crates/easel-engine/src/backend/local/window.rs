use std::sync::Arc;

use anyhow::{Context, Result};
use ouroboros::self_referencing;
use tiny_skia::Pixmap;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::{Window, WindowId};

use crate::input::platform::winit::translate_window_event;
use crate::input::InputTracker;
use crate::scene::SharedFrames;

use super::blit::Blitter;
use super::gpu::{Gpu, GpuInit, SurfaceErrorAction};
use super::raster::Rasterizer;
use super::{LocalShared, RenderRequest};

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// Everything that only exists while the window does.
struct Surface {
    entry: WindowEntry,
    blitter: Blitter,
    pixmap: Option<Pixmap>,
}

/// Event-loop side of the local backend.
///
/// Owns the single window. Input goes straight into the tracker; drawing
/// happens only when the program thread asks for a redraw (or the platform
/// does, after exposure or resize).
pub struct LocalApp {
    title: String,
    initial_size: LogicalSize<f64>,
    gpu_init: GpuInit,
    linger: bool,

    frames: SharedFrames,
    input: Arc<InputTracker>,
    shared: Arc<LocalShared>,
    rasterizer: Rasterizer,

    surface: Option<Surface>,
    program_finished: bool,
    failure: Option<anyhow::Error>,
}

impl LocalApp {
    pub fn new(
        title: String,
        shared: Arc<LocalShared>,
        frames: SharedFrames,
        input: Arc<InputTracker>,
        rasterizer: Rasterizer,
        linger: bool,
    ) -> Self {
        let (w, h) = shared.size();
        Self {
            title,
            initial_size: LogicalSize::new(w as f64, h as f64),
            gpu_init: GpuInit::default(),
            linger,
            frames,
            input,
            shared,
            rasterizer,
            surface: None,
            program_finished: false,
            failure: None,
        }
    }

    /// The error that stopped the loop, if any.
    pub fn take_failure(&mut self) -> Option<anyhow::Error> {
        self.failure.take()
    }

    fn create_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(self.initial_size);

        let window = event_loop.create_window(attrs).context("failed to create window")?;
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        let blitter = entry.with_gpu(|gpu| Blitter::new(gpu));
        entry.with_window(|w| w.request_redraw());

        self.surface = Some(Surface { entry, blitter, pixmap: None });
        Ok(())
    }

    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        self.shared.mark_closed();
        self.surface = None;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("local backend failed: {err:#}");
        self.failure = Some(err);
        self.shut_down(event_loop);
    }

    /// Rasterizes the display buffer and shows it. Returns `false` on a fatal surface error.
    fn redraw(&mut self) -> bool {
        let Some(surface) = self.surface.as_mut() else { return true };

        let size = surface.entry.with_gpu(|gpu| gpu.size());
        if size.width == 0 || size.height == 0 {
            return true;
        }

        let stale = surface
            .pixmap
            .as_ref()
            .is_none_or(|p| p.width() != size.width || p.height() != size.height);
        if stale {
            surface.pixmap = Pixmap::new(size.width, size.height);
        }
        let Some(pixmap) = surface.pixmap.as_mut() else { return true };

        let scale = surface.entry.with_window(|w| w.scale_factor()) as f32;
        let display = self.frames.display();
        self.rasterizer.render(&display, pixmap, scale);

        let blitter = &mut surface.blitter;
        surface.entry.with_gpu_mut(|gpu| {
            blitter.upload(gpu, pixmap);
            match gpu.begin_frame() {
                Ok(mut frame) => {
                    blitter.draw(&mut frame.encoder, &frame.view);
                    gpu.submit(frame);
                    true
                }
                Err(err) => match gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => false,
                    action => {
                        log::debug!("surface error handled: {action:?}");
                        true
                    }
                },
            }
        })
    }
}

impl ApplicationHandler<RenderRequest> for LocalApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() {
            return;
        }
        event_loop.set_control_flow(ControlFlow::Wait);

        if let Err(e) = self.create_surface(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, request: RenderRequest) {
        match request {
            RenderRequest::Redraw => {
                if let Some(s) = &self.surface {
                    s.entry.with_window(|w| w.request_redraw());
                }
            }
            RenderRequest::Resize { width, height } => {
                if let Some(s) = &self.surface {
                    let _ = s.entry.with_window(|w| w.request_inner_size(LogicalSize::new(width, height)));
                }
            }
            RenderRequest::SetTitle(title) => {
                if let Some(s) = &self.surface {
                    s.entry.with_window(|w| w.set_title(&title));
                }
                self.title = title;
            }
            RenderRequest::Close => self.shut_down(event_loop),
            RenderRequest::ProgramFinished => {
                self.program_finished = true;
                if self.linger {
                    log::info!("program finished; window stays open until closed");
                } else {
                    self.shut_down(event_loop);
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(surface) = self.surface.as_mut() else { return };

        let translated = surface.entry.with_window(|w| translate_window_event(w, &event));
        match translated {
            Some(Ok(ev)) => self.input.report(ev),
            Some(Err(e)) => log::debug!("input dropped: {e}"),
            None => {}
        }

        match &event {
            WindowEvent::CloseRequested => {
                log::info!("window closed");
                self.shut_down(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                surface.entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                let logical = surface.entry.with_window(|w| new_size.to_logical::<f64>(w.scale_factor()));
                self.shared.set_size(logical.width.round() as u32, logical.height.round() as u32);
                surface.entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = surface.entry.with_window(|w| w.inner_size());
                surface.entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                surface.entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => {
                if !self.redraw() {
                    self.fail(event_loop, anyhow::anyhow!("GPU out of memory"));
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shared.mark_closed();
        if !self.program_finished {
            log::debug!("event loop exiting before the program returned");
        }
    }
}
