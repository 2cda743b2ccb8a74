use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::backend::Backend;
use crate::component::{Component, ComponentId, ComponentRegistry};
use crate::coords::Vec2;
use crate::error::EngineResult;
use crate::input::{InputId, InputSnapshot, InputTracker, KeyId, MouseButton};
use crate::scene::{SharedFrames, SwapMode};
use crate::time::{wait_for_fps, FramePacer, FrameTime};

use super::Canvas;

/// Poll interval of [`Engine::wait_until_closed`].
const CLOSE_POLL: Duration = Duration::from_millis(50);

/// The per-program engine context.
///
/// Owns the canvas (and through it the backend), the last frozen input
/// snapshot, the component registry and the frame pacer. Drawing calls go
/// through `Deref<Target = Canvas>`.
pub struct Engine {
    canvas: Canvas,
    input: Arc<InputTracker>,
    snapshot: InputSnapshot,
    components: ComponentRegistry,
    pacer: FramePacer,
}

impl Engine {
    /// Builds an engine around `backend`.
    ///
    /// `frames` and `input` are shared with the backend's own threads.
    pub fn new(backend: Box<dyn Backend>, frames: SharedFrames, input: Arc<InputTracker>) -> Self {
        Self {
            canvas: Canvas::new(backend, frames),
            input,
            snapshot: InputSnapshot::default(),
            components: ComponentRegistry::new(),
            pacer: FramePacer::new(),
        }
    }

    #[inline]
    pub fn canvas(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    // ── Frame delivery ────────────────────────────────────────────────────

    /// Shows everything drawn so far and keeps accumulating into the same frame.
    ///
    /// Blocks until `wait` has passed since the previous delivery.
    pub fn deliver(&mut self, wait: Duration) -> EngineResult<FrameTime> {
        self.deliver_with(wait, SwapMode::Accumulate)
    }

    /// Shows everything drawn since the previous delivery, then starts an
    /// empty frame.
    pub fn deliver_and_clear(&mut self, wait: Duration) -> EngineResult<FrameTime> {
        self.deliver_with(wait, SwapMode::Clear)
    }

    /// [`deliver`](Self::deliver) paced to at most `fps` frames per second.
    pub fn deliver_fps(&mut self, fps: f32) -> EngineResult<FrameTime> {
        self.deliver(wait_for_fps(fps))
    }

    pub fn deliver_and_clear_fps(&mut self, fps: f32) -> EngineResult<FrameTime> {
        self.deliver_and_clear(wait_for_fps(fps))
    }

    fn deliver_with(&mut self, wait: Duration, mode: SwapMode) -> EngineResult<FrameTime> {
        let time = self.pacer.pace(wait);

        self.snapshot = self.input.freeze();
        self.components.dispatch(&self.snapshot, &mut self.canvas);

        let shown = self.canvas.swap(mode);
        log::trace!("frame {} delivered ({:?}, {} commands)", time.frame_index, mode, shown.len());

        self.canvas.present()?;
        Ok(time)
    }

    // ── Components ────────────────────────────────────────────────────────

    pub fn add_component<C: Component>(&mut self, component: C) -> ComponentId {
        self.components.add(component)
    }

    /// Unregisters a component. Unknown handles are a configuration error.
    pub fn remove_component(&mut self, id: ComponentId) -> EngineResult<Box<dyn Component>> {
        self.components.remove(id)
    }

    #[inline]
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    // ── Input polling ─────────────────────────────────────────────────────
    //
    // Every query reads the snapshot frozen by the last delivery.

    #[inline]
    pub fn input(&self) -> &InputSnapshot {
        &self.snapshot
    }

    /// The live tracker backends report into.
    #[inline]
    pub fn input_tracker(&self) -> &Arc<InputTracker> {
        &self.input
    }

    #[inline]
    pub fn is_pressed(&self, id: &InputId) -> bool {
        self.snapshot.is_held(id)
    }

    /// Newly pressed during the last frame.
    #[inline]
    pub fn was_pressed(&self, id: &InputId) -> bool {
        self.snapshot.was_pressed(id)
    }

    /// Released during the last frame.
    #[inline]
    pub fn was_released(&self, id: &InputId) -> bool {
        self.snapshot.was_released(id)
    }

    /// Whether the named key is held. Names outside the key vocabulary fail.
    pub fn is_key_pressed(&self, name: &str) -> EngineResult<bool> {
        let key = KeyId::parse(name, None)?;
        Ok(self.snapshot.is_held(&InputId::Key(key)))
    }

    /// Whether the named key was released during the last frame.
    pub fn was_key_typed(&self, name: &str) -> EngineResult<bool> {
        let key = KeyId::parse(name, None)?;
        Ok(self.snapshot.was_released(&InputId::Key(key)))
    }

    #[inline]
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.snapshot.is_held(&InputId::Mouse(button))
    }

    #[inline]
    pub fn was_clicked(&self, button: MouseButton) -> bool {
        self.snapshot.button_released(button)
    }

    #[inline]
    pub fn mouse(&self) -> Vec2 {
        self.snapshot.mouse()
    }

    #[inline]
    pub fn mouse_x(&self) -> f32 {
        self.snapshot.mouse().x
    }

    #[inline]
    pub fn mouse_y(&self) -> f32 {
        self.snapshot.mouse().y
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Blocks until the window or connection goes away.
    pub fn wait_until_closed(&self) {
        while self.canvas.is_open() {
            thread::sleep(CLOSE_POLL);
        }
    }
}

impl Deref for Engine {
    type Target = Canvas;

    fn deref(&self) -> &Canvas {
        &self.canvas
    }
}

impl DerefMut for Engine {
    fn deref_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }
}
