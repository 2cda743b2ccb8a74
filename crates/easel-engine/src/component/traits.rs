use crate::coords::Rect;
use crate::core::Canvas;
use crate::input::{KeyId, MouseButton};

// ── Component ─────────────────────────────────────────────────────────────

/// Anything the engine can dispatch to once per delivered frame.
///
/// A component opts into each capability by overriding the matching accessor
/// and returning `Some(self)`; every accessor defaults to `None`.
///
/// ```rust,ignore
/// struct Badge { area: Rect, lit: bool }
///
/// impl Component for Badge {
///     fn as_drawable(&mut self) -> Option<&mut dyn Drawable> { Some(self) }
///     fn as_hoverable(&mut self) -> Option<&mut dyn Hoverable> { Some(self) }
/// }
/// ```
pub trait Component: 'static {
    fn as_drawable(&mut self) -> Option<&mut dyn Drawable> {
        None
    }

    fn as_hoverable(&mut self) -> Option<&mut dyn Hoverable> {
        None
    }

    fn as_clickable(&mut self) -> Option<&mut dyn Clickable> {
        None
    }

    fn as_listener(&mut self) -> Option<&mut dyn EventListener> {
        None
    }
}

// ── Capabilities ──────────────────────────────────────────────────────────

/// Draws itself once per frame.
///
/// The canvas handed to `draw` starts from default settings; whatever the
/// component changes is rolled back afterwards.
pub trait Drawable {
    fn draw(&mut self, canvas: &mut Canvas);
}

/// Receives enter/exit notifications when the mouse crosses `hover_area`.
pub trait Hoverable {
    fn hover_area(&self) -> Rect;

    fn on_mouse_enter(&mut self) {}

    fn on_mouse_exit(&mut self) {}
}

/// Receives clicks released inside `click_area`.
pub trait Clickable {
    fn click_area(&self) -> Rect;

    fn on_left_click(&mut self, _x: f32, _y: f32) {}

    fn on_right_click(&mut self, _x: f32, _y: f32) {}
}

/// Receives every press and release observed in a frame, wherever the mouse is.
pub trait EventListener {
    fn on_key_press(&mut self, _key: &KeyId) {}

    fn on_key_release(&mut self, _key: &KeyId) {}

    fn on_mouse_press(&mut self, _button: MouseButton) {}

    fn on_mouse_release(&mut self, _button: MouseButton) {}
}
