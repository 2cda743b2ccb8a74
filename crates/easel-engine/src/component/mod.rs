//! Component registration and per-frame dispatch.
//!
//! Components are moved into an arena and addressed by [`ComponentId`]; the
//! dispatcher walks them in registration order once per delivered frame.

mod dispatch;
mod registry;
mod traits;

pub use registry::{ComponentId, ComponentRegistry};
pub use traits::{Clickable, Component, Drawable, EventListener, Hoverable};
