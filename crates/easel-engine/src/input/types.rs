use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{EngineError, EngineResult};

/// Named keys accepted besides single printable characters.
const NAMED_KEYS: &[&str] = &[
    "space", "enter", "escape", "backspace", "tab",
    "shift", "control", "alt", "meta", "capslock",
    "up", "down", "left", "right",
    "insert", "delete", "home", "end", "pageup", "pagedown",
    "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12",
];

/// Alternate spellings folded into the canonical names above.
const ALIASES: &[(&str, &str)] = &[
    (" ", "space"),
    ("return", "enter"),
    ("esc", "escape"),
    ("ctrl", "control"),
    ("super", "meta"),
    ("arrowup", "up"),
    ("arrowdown", "down"),
    ("arrowleft", "left"),
    ("arrowright", "right"),
    ("del", "delete"),
];

/// Keyboard key identifier.
///
/// Identity is the canonical lowercase name; the typed character is payload
/// that travels with the event (so `Shift+A` and a later plain `a` release
/// refer to the same key).
#[derive(Debug, Clone, Eq)]
pub struct KeyId {
    name: String,
    ch: Option<char>,
}

impl KeyId {
    /// Translates a raw key name into the recognized vocabulary.
    ///
    /// Names are matched case-insensitively. Anything outside the vocabulary
    /// is rejected here so it never reaches the tracker.
    pub fn parse(raw: &str, ch: Option<char>) -> EngineResult<Self> {
        let lowered = raw.to_ascii_lowercase();
        let name = if let Some((_, canon)) = ALIASES.iter().find(|(a, _)| *a == lowered) {
            (*canon).to_string()
        } else if NAMED_KEYS.contains(&lowered.as_str()) || is_printable_char(&lowered) {
            lowered
        } else {
            return Err(EngineError::InvalidInput(format!("unknown key `{raw}`")));
        };
        Ok(Self { name, ch })
    }

    /// Canonical lowercase name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Character produced by the keystroke, when there is one.
    #[inline]
    pub fn ch(&self) -> Option<char> {
        self.ch
    }
}

fn is_printable_char(s: &str) -> bool {
    let mut chars = s.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_graphic())
}

impl PartialEq for KeyId {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for KeyId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Mouse button identifier. Only the two primary buttons are tracked.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

impl MouseButton {
    /// Parses the wire code: `0` = left, `1` = right.
    pub fn from_wire(code: &str) -> EngineResult<Self> {
        match code.trim() {
            "0" => Ok(MouseButton::Left),
            "1" => Ok(MouseButton::Right),
            other => Err(EngineError::InvalidInput(format!("unknown mouse button `{other}`"))),
        }
    }

    #[inline]
    pub fn is_left(self) -> bool {
        self == MouseButton::Left
    }
}

/// Anything that can be held or released.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum InputId {
    Key(KeyId),
    Mouse(MouseButton),
}

impl InputId {
    /// Shorthand for a key identifier parsed from `name`.
    pub fn key(name: &str) -> EngineResult<Self> {
        KeyId::parse(name, None).map(InputId::Key)
    }

    #[inline]
    pub const fn mouse(button: MouseButton) -> Self {
        InputId::Mouse(button)
    }
}

impl From<KeyId> for InputId {
    fn from(k: KeyId) -> Self {
        InputId::Key(k)
    }
}

impl From<MouseButton> for InputId {
    fn from(b: MouseButton) -> Self {
        InputId::Mouse(b)
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputId::Key(k) => write!(f, "key:{}", k.name),
            InputId::Mouse(MouseButton::Left) => f.write_str("mouse:left"),
            InputId::Mouse(MouseButton::Right) => f.write_str("mouse:right"),
        }
    }
}

/// Platform-agnostic input events produced by backends.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Press(InputId),
    Release(InputId),
    MouseMoved { x: f32, y: f32 },
    /// Window lost focus; held inputs are dropped to avoid stuck keys.
    FocusLost,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_names_compare_case_insensitively() {
        let a = KeyId::parse("A", Some('A')).unwrap();
        let b = KeyId::parse("a", Some('a')).unwrap();
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(InputId::Key(a));
        assert!(set.contains(&InputId::Key(b)));
    }

    #[test]
    fn aliases_fold_to_canonical_names() {
        assert_eq!(KeyId::parse("ArrowUp", None).unwrap().name(), "up");
        assert_eq!(KeyId::parse(" ", Some(' ')).unwrap().name(), "space");
        assert_eq!(KeyId::parse("ENTER", None).unwrap().name(), "enter");
        assert_eq!(KeyId::parse(",", Some(',')).unwrap().name(), ",");
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(matches!(KeyId::parse("hyperdrive", None), Err(EngineError::InvalidInput(_))));
        assert!(KeyId::parse("", None).is_err());
        assert!(KeyId::parse("é", None).is_err());
    }

    #[test]
    fn mouse_wire_codes() {
        assert_eq!(MouseButton::from_wire("0").unwrap(), MouseButton::Left);
        assert_eq!(MouseButton::from_wire("1").unwrap(), MouseButton::Right);
        assert!(MouseButton::from_wire("2").is_err());
    }
}
