//! Easel engine crate.
//!
//! A small drawing engine for frame-based programs: user code records drawing
//! commands on a [`Canvas`], delivers frames at a steady pace, polls a frozen
//! per-frame input snapshot and optionally registers interactive components.
//! Frames are shown either in a native window or in a browser page.

pub mod backend;
pub mod component;
pub mod config;
pub mod coords;
pub mod core;
pub mod error;
pub mod input;
pub mod logging;
pub mod paint;
pub mod scene;
pub mod time;

mod launch;

pub use crate::config::{LaunchConfig, Mode};
pub use crate::core::{Canvas, Engine};
pub use crate::error::{Capability, EngineError, EngineResult};
pub use crate::launch::{launch, launch_from_env};
