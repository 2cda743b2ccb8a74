use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::paint::PaintState;

use super::{CommandBuffer, DrawCmd};

/// How a delivery turns the live buffer into the displayed one.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SwapMode {
    /// Show a copy of the live buffer and keep accumulating into it.
    Accumulate,
    /// Show the live buffer and start a fresh one.
    Clear,
}

/// The live/display buffer pair.
///
/// Exactly one buffer accepts commands (`live`) and exactly one is shown
/// (`display`). The display buffer is immutable once installed; backends
/// share it through the `Arc`.
#[derive(Debug)]
pub struct FramePair {
    pub live: CommandBuffer,
    pub display: Arc<CommandBuffer>,
}

impl FramePair {
    pub fn new(state: &PaintState) -> Self {
        Self {
            live: CommandBuffer::seeded(state),
            display: Arc::new(CommandBuffer::seeded(state)),
        }
    }

    /// Installs a new display buffer according to `mode`.
    ///
    /// `seed` is the style the next live buffer starts from in clear mode.
    pub fn swap(&mut self, mode: SwapMode, seed: &PaintState) -> Arc<CommandBuffer> {
        self.display = match mode {
            SwapMode::Accumulate => Arc::new(self.live.clone()),
            SwapMode::Clear => Arc::new(mem::replace(&mut self.live, CommandBuffer::seeded(seed))),
        };
        Arc::clone(&self.display)
    }
}

/// The frame pair behind its monitor.
///
/// Every reassignment of `{live, display}` happens inside one critical section,
/// so a backend redraw reading `display` never observes a half-swapped pair.
#[derive(Debug, Clone)]
pub struct SharedFrames(Arc<Mutex<FramePair>>);

impl SharedFrames {
    pub fn new(state: &PaintState) -> Self {
        Self(Arc::new(Mutex::new(FramePair::new(state))))
    }

    /// Appends a command to the live buffer.
    #[inline]
    pub fn record(&self, cmd: DrawCmd) {
        self.0.lock().live.push(cmd);
    }

    pub fn swap(&self, mode: SwapMode, seed: &PaintState) -> Arc<CommandBuffer> {
        self.0.lock().swap(mode, seed)
    }

    /// The buffer currently shown.
    pub fn display(&self) -> Arc<CommandBuffer> {
        Arc::clone(&self.0.lock().display)
    }

    /// Number of commands recorded into the live buffer so far.
    pub fn live_len(&self) -> usize {
        self.0.lock().live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;

    fn rect(n: f32) -> DrawCmd {
        DrawCmd::FillRect(Rect::new(n, n, n, n))
    }

    #[test]
    fn clear_swap_starts_a_fresh_live_buffer() {
        let frames = SharedFrames::new(&PaintState::default());
        frames.record(rect(1.0));
        let shown = frames.swap(SwapMode::Clear, &PaintState::default());
        assert_eq!(shown.drawing().count(), 1);
        assert_eq!(frames.live_len(), 1, "only the seed command remains");
    }

    #[test]
    fn accumulate_swap_keeps_live_contents() {
        let frames = SharedFrames::new(&PaintState::default());
        frames.record(rect(1.0));
        let first = frames.swap(SwapMode::Accumulate, &PaintState::default());
        frames.record(rect(2.0));
        let second = frames.swap(SwapMode::Accumulate, &PaintState::default());

        assert_eq!(first.drawing().count(), 1);
        assert_eq!(second.drawing().count(), 2);
        assert!(second.commands().starts_with(first.commands()));
    }

    #[test]
    fn display_survives_later_recording() {
        let frames = SharedFrames::new(&PaintState::default());
        frames.record(rect(1.0));
        let shown = frames.swap(SwapMode::Accumulate, &PaintState::default());
        frames.record(rect(2.0));
        assert_eq!(frames.display(), shown);
        assert_eq!(shown.drawing().count(), 1);
    }
}
