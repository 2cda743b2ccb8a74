use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, KeyEvent, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

use crate::error::{EngineError, EngineResult};
use crate::input::{InputEvent, InputId, KeyId, MouseButton};

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// Returns `None` for events the input subsystem does not track, and
/// `Some(Err(_))` for input outside the recognized vocabulary (extra mouse
/// buttons, unmapped keys); callers log and drop those.
pub fn translate_window_event(window: &Window, event: &WindowEvent) -> Option<EngineResult<InputEvent>> {
    match event {
        WindowEvent::Focused(false) => Some(Ok(InputEvent::FocusLost)),

        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = to_logical_f32(window, *position);
            Some(Ok(InputEvent::MouseMoved { x, y }))
        }

        WindowEvent::MouseInput { state, button, .. } => {
            let id = match map_mouse_button(*button) {
                Ok(b) => InputId::Mouse(b),
                Err(e) => return Some(Err(e)),
            };
            Some(Ok(match state {
                ElementState::Pressed => InputEvent::Press(id),
                ElementState::Released => InputEvent::Release(id),
            }))
        }

        WindowEvent::KeyboardInput { event, .. } => {
            let key = match map_key(event) {
                Ok(k) => k,
                Err(e) => return Some(Err(e)),
            };
            let id = InputId::Key(key);
            Some(Ok(match event.state {
                ElementState::Pressed => InputEvent::Press(id),
                ElementState::Released => InputEvent::Release(id),
            }))
        }

        _ => None,
    }
}

fn to_logical_f32(window: &Window, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let scale = window.scale_factor();
    let logical = pos.to_logical::<f64>(scale);
    (logical.x as f32, logical.y as f32)
}

fn map_mouse_button(b: WinitMouseButton) -> EngineResult<MouseButton> {
    match b {
        WinitMouseButton::Left => Ok(MouseButton::Left),
        WinitMouseButton::Right => Ok(MouseButton::Right),
        other => Err(EngineError::InvalidInput(format!("untracked mouse button {other:?}"))),
    }
}

/// Names the physical key. The produced text is payload only, so a press and
/// its release carry the same identity regardless of modifiers.
fn map_key(event: &KeyEvent) -> EngineResult<KeyId> {
    let ch = event.text.as_ref().and_then(|t| t.chars().next());

    let name = match event.physical_key {
        PhysicalKey::Code(code) => key_code_name(code),
        PhysicalKey::Unidentified(_) => None,
    };
    let Some(name) = name else {
        return Err(EngineError::InvalidInput(format!("untracked key {:?}", event.physical_key)));
    };

    KeyId::parse(name, ch)
}

fn key_code_name(code: KeyCode) -> Option<&'static str> {
    let name = match code {
        KeyCode::Escape => "escape",
        KeyCode::Enter | KeyCode::NumpadEnter => "enter",
        KeyCode::Tab => "tab",
        KeyCode::Backspace => "backspace",
        KeyCode::Space => "space",
        KeyCode::CapsLock => "capslock",

        KeyCode::Insert => "insert",
        KeyCode::Delete => "delete",
        KeyCode::Home => "home",
        KeyCode::End => "end",
        KeyCode::PageUp => "pageup",
        KeyCode::PageDown => "pagedown",

        KeyCode::ArrowUp => "up",
        KeyCode::ArrowDown => "down",
        KeyCode::ArrowLeft => "left",
        KeyCode::ArrowRight => "right",

        KeyCode::ShiftLeft | KeyCode::ShiftRight => "shift",
        KeyCode::ControlLeft | KeyCode::ControlRight => "control",
        KeyCode::AltLeft | KeyCode::AltRight => "alt",
        KeyCode::SuperLeft | KeyCode::SuperRight => "meta",

        KeyCode::KeyA => "a",
        KeyCode::KeyB => "b",
        KeyCode::KeyC => "c",
        KeyCode::KeyD => "d",
        KeyCode::KeyE => "e",
        KeyCode::KeyF => "f",
        KeyCode::KeyG => "g",
        KeyCode::KeyH => "h",
        KeyCode::KeyI => "i",
        KeyCode::KeyJ => "j",
        KeyCode::KeyK => "k",
        KeyCode::KeyL => "l",
        KeyCode::KeyM => "m",
        KeyCode::KeyN => "n",
        KeyCode::KeyO => "o",
        KeyCode::KeyP => "p",
        KeyCode::KeyQ => "q",
        KeyCode::KeyR => "r",
        KeyCode::KeyS => "s",
        KeyCode::KeyT => "t",
        KeyCode::KeyU => "u",
        KeyCode::KeyV => "v",
        KeyCode::KeyW => "w",
        KeyCode::KeyX => "x",
        KeyCode::KeyY => "y",
        KeyCode::KeyZ => "z",

        KeyCode::Digit0 | KeyCode::Numpad0 => "0",
        KeyCode::Digit1 | KeyCode::Numpad1 => "1",
        KeyCode::Digit2 | KeyCode::Numpad2 => "2",
        KeyCode::Digit3 | KeyCode::Numpad3 => "3",
        KeyCode::Digit4 | KeyCode::Numpad4 => "4",
        KeyCode::Digit5 | KeyCode::Numpad5 => "5",
        KeyCode::Digit6 | KeyCode::Numpad6 => "6",
        KeyCode::Digit7 | KeyCode::Numpad7 => "7",
        KeyCode::Digit8 | KeyCode::Numpad8 => "8",
        KeyCode::Digit9 | KeyCode::Numpad9 => "9",

        KeyCode::Minus => "-",
        KeyCode::Equal => "=",
        KeyCode::BracketLeft => "[",
        KeyCode::BracketRight => "]",
        KeyCode::Backslash => "\\",
        KeyCode::Semicolon => ";",
        KeyCode::Quote => "'",
        KeyCode::Comma => ",",
        KeyCode::Period => ".",
        KeyCode::Slash => "/",
        KeyCode::Backquote => "`",

        KeyCode::F1 => "f1",
        KeyCode::F2 => "f2",
        KeyCode::F3 => "f3",
        KeyCode::F4 => "f4",
        KeyCode::F5 => "f5",
        KeyCode::F6 => "f6",
        KeyCode::F7 => "f7",
        KeyCode::F8 => "f8",
        KeyCode::F9 => "f9",
        KeyCode::F10 => "f10",
        KeyCode::F11 => "f11",
        KeyCode::F12 => "f12",

        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputTracker;

    #[test]
    fn key_codes_name_the_unshifted_key() {
        assert_eq!(key_code_name(KeyCode::Digit1), Some("1"));
        assert_eq!(key_code_name(KeyCode::KeyA), Some("a"));
        assert_eq!(key_code_name(KeyCode::Slash), Some("/"));
        assert_eq!(key_code_name(KeyCode::ShiftRight), Some("shift"));
        assert_eq!(key_code_name(KeyCode::MediaPlayPause), None);
    }

    #[test]
    fn every_named_key_code_is_in_the_vocabulary() {
        let codes = [
            KeyCode::Escape, KeyCode::NumpadEnter, KeyCode::CapsLock, KeyCode::PageDown,
            KeyCode::ArrowLeft, KeyCode::SuperLeft, KeyCode::Numpad7, KeyCode::Backslash,
            KeyCode::Backquote, KeyCode::Quote, KeyCode::F12,
        ];
        for code in codes {
            let name = key_code_name(code).unwrap();
            assert!(KeyId::parse(name, None).is_ok(), "{code:?} -> {name}");
        }
    }

    #[test]
    fn shifted_press_is_released_by_the_same_key() {
        // Shift+1 produces '!', the release after Shift is up produces '1'.
        let name = key_code_name(KeyCode::Digit1).unwrap();
        let press = KeyId::parse(name, Some('!')).unwrap();
        let release = KeyId::parse(name, Some('1')).unwrap();

        let tracker = InputTracker::new();
        tracker.report(InputEvent::Press(InputId::Key(press)));
        tracker.report(InputEvent::Release(InputId::Key(release)));

        let snap = tracker.freeze();
        assert!(!snap.key_held("1"));
        assert!(snap.key_typed("1"));
        assert_eq!(snap.held().count(), 0);
    }
}
