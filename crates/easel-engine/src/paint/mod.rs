//! Style model applied to subsequent drawing.
//!
//! Scope:
//! - color representation (straight-alpha sRGB bytes)
//! - the mutable `PaintState` and its clamping rules

pub mod color;
pub mod state;

pub use color::Color;
pub use state::{PaintState, TextAlign};
