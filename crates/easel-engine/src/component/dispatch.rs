use crate::core::Canvas;
use crate::input::{InputId, InputSnapshot, MouseButton};

use super::{ComponentRegistry, EventListener};

impl ComponentRegistry {
    /// Runs every registered component against one frozen input snapshot.
    ///
    /// Per component, in registration order: hover transition, click, event
    /// replay, draw. Drawing happens between a settings reset and a restore of
    /// the settings that were current before the component ran.
    pub fn dispatch(&mut self, input: &InputSnapshot, canvas: &mut Canvas) {
        let mouse = input.mouse();

        for &id in &self.order {
            let Some(component) = self.arena.get_mut(id) else { continue };

            if let Some(h) = component.as_hoverable() {
                let inside = h.hover_area().contains_point(mouse);
                let was_inside = self.hovered.contains(&id);
                if inside && !was_inside {
                    self.hovered.insert(id);
                    h.on_mouse_enter();
                } else if !inside && was_inside {
                    self.hovered.remove(&id);
                    h.on_mouse_exit();
                }
            }

            if let Some(c) = component.as_clickable() {
                if c.click_area().contains_point(mouse) {
                    if input.button_released(MouseButton::Left) {
                        c.on_left_click(mouse.x, mouse.y);
                    }
                    if input.button_released(MouseButton::Right) {
                        c.on_right_click(mouse.x, mouse.y);
                    }
                }
            }

            if let Some(l) = component.as_listener() {
                replay(l, input);
            }

            if let Some(d) = component.as_drawable() {
                let saved = canvas.settings().clone();
                canvas.reset_settings();
                d.draw(canvas);
                canvas.restore_settings(saved);
            }
        }
    }
}

fn replay(listener: &mut dyn EventListener, input: &InputSnapshot) {
    for id in input.pressed() {
        match id {
            InputId::Key(k) => listener.on_key_press(k),
            InputId::Mouse(b) => listener.on_mouse_press(*b),
        }
    }
    for id in input.released() {
        match id {
            InputId::Key(k) => listener.on_key_release(k),
            InputId::Mouse(b) => listener.on_mouse_release(*b),
        }
    }
}
