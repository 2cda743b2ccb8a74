use std::collections::HashSet;
use std::mem;

use parking_lot::Mutex;

use crate::coords::Vec2;

use super::snapshot::InputSnapshot;
use super::types::{InputEvent, InputId};

#[derive(Debug, Default)]
struct LiveInput {
    held: HashSet<InputId>,
    pressed: HashSet<InputId>,
    released: HashSet<InputId>,
    mouse: Vec2,
}

/// Thread-safe live input sets.
///
/// Backends mutate it from their event-producer thread; frame delivery reads it
/// exactly once per frame through [`freeze`](Self::freeze). One lock guards all
/// sets so a snapshot never mixes two producer states.
#[derive(Debug, Default)]
pub struct InputTracker {
    live: Mutex<LiveInput>,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as held. Repeats of an already-held id are not new presses.
    pub fn press(&self, id: InputId) {
        let mut live = self.live.lock();
        if live.held.insert(id.clone()) {
            live.pressed.insert(id);
        }
    }

    /// Releases `id`. Releases of ids that were never held are ignored.
    pub fn release(&self, id: InputId) {
        let mut live = self.live.lock();
        if live.held.remove(&id) {
            live.released.insert(id);
        }
    }

    pub fn move_mouse(&self, x: f32, y: f32) {
        self.live.lock().mouse = Vec2::new(x, y);
    }

    /// Applies a translated backend event.
    pub fn report(&self, event: InputEvent) {
        match event {
            InputEvent::Press(id) => self.press(id),
            InputEvent::Release(id) => self.release(id),
            InputEvent::MouseMoved { x, y } => self.move_mouse(x, y),
            InputEvent::FocusLost => self.live.lock().held.clear(),
        }
    }

    /// Copies the live state into a snapshot and clears the per-frame transitions.
    ///
    /// `held` is copied and kept; `pressed`/`released` move into the snapshot so
    /// each transition is visible in exactly one frame.
    pub fn freeze(&self) -> InputSnapshot {
        let mut live = self.live.lock();
        InputSnapshot {
            held: live.held.clone(),
            pressed: mem::take(&mut live.pressed),
            released: mem::take(&mut live.released),
            mouse: live.mouse,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::input::{KeyId, MouseButton};

    fn key(name: &str) -> InputId {
        InputId::Key(KeyId::parse(name, None).unwrap())
    }

    #[test]
    fn released_is_visible_for_exactly_one_frame() {
        let t = InputTracker::new();
        t.press(key("a"));
        t.release(key("a"));

        let first = t.freeze();
        assert!(first.was_released(&key("a")));
        assert!(first.was_pressed(&key("a")));
        assert!(!first.is_held(&key("a")));

        let second = t.freeze();
        assert!(!second.was_released(&key("a")));
        assert!(!second.was_pressed(&key("a")));
    }

    #[test]
    fn held_persists_until_release() {
        let t = InputTracker::new();
        t.press(key("up"));
        assert!(t.freeze().is_held(&key("up")));
        assert!(t.freeze().is_held(&key("up")));
        t.release(key("up"));
        let s = t.freeze();
        assert!(!s.is_held(&key("up")));
        assert!(s.was_released(&key("up")));
    }

    #[test]
    fn repeated_press_is_not_a_new_press() {
        let t = InputTracker::new();
        t.press(key("x"));
        t.freeze();
        t.press(key("x"));
        assert!(!t.freeze().was_pressed(&key("x")));
    }

    #[test]
    fn stray_release_is_ignored() {
        let t = InputTracker::new();
        t.release(InputId::Mouse(MouseButton::Left));
        assert!(!t.freeze().button_released(MouseButton::Left));
    }

    #[test]
    fn snapshot_is_stable_under_concurrent_producers() {
        let t = Arc::new(InputTracker::new());
        t.press(key("space"));
        let snapshot = t.freeze();

        let producer = {
            let t = Arc::clone(&t);
            thread::spawn(move || {
                for i in 0..1000 {
                    t.move_mouse(i as f32, i as f32);
                    t.release(key("space"));
                    t.press(key("space"));
                }
            })
        };
        producer.join().unwrap();

        assert!(snapshot.is_held(&key("space")));
        assert_eq!(snapshot.mouse(), Vec2::zero());
        assert_eq!(t.freeze().mouse(), Vec2::new(999.0, 999.0));
    }

    #[test]
    fn focus_loss_drops_held_inputs() {
        let t = InputTracker::new();
        t.report(InputEvent::Press(key("shift")));
        t.report(InputEvent::FocusLost);
        assert!(!t.freeze().is_held(&key("shift")));
    }
}
