use std::collections::HashSet;

use crate::coords::Vec2;

use super::types::{InputId, KeyId, MouseButton};

/// Frozen per-frame view of input.
///
/// `held` is the state (what is down); `pressed` and `released` are the
/// transitions that happened since the previous delivery. A snapshot is never
/// mutated after it is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub(crate) held: HashSet<InputId>,
    pub(crate) pressed: HashSet<InputId>,
    pub(crate) released: HashSet<InputId>,
    pub(crate) mouse: Vec2,
}

impl InputSnapshot {
    #[inline]
    pub fn is_held(&self, id: &InputId) -> bool {
        self.held.contains(id)
    }

    #[inline]
    pub fn was_pressed(&self, id: &InputId) -> bool {
        self.pressed.contains(id)
    }

    #[inline]
    pub fn was_released(&self, id: &InputId) -> bool {
        self.released.contains(id)
    }

    #[inline]
    pub fn mouse(&self) -> Vec2 {
        self.mouse
    }

    #[inline]
    pub fn button_released(&self, button: MouseButton) -> bool {
        self.released.contains(&InputId::Mouse(button))
    }

    /// Looks up a key by raw name; unknown names are simply not held.
    pub fn key_held(&self, name: &str) -> bool {
        KeyId::parse(name, None).is_ok_and(|k| self.held.contains(&InputId::Key(k)))
    }

    pub fn key_typed(&self, name: &str) -> bool {
        KeyId::parse(name, None).is_ok_and(|k| self.released.contains(&InputId::Key(k)))
    }

    pub fn held(&self) -> impl Iterator<Item = &InputId> {
        self.held.iter()
    }

    pub fn pressed(&self) -> impl Iterator<Item = &InputId> {
        self.pressed.iter()
    }

    pub fn released(&self) -> impl Iterator<Item = &InputId> {
        self.released.iter()
    }
}
