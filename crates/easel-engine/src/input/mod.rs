//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Backends translate raw platform or socket events into `InputEvent`s and feed
//! them to the shared `InputTracker`; frame delivery freezes an `InputSnapshot`
//! that every poll reads until the next delivery.

pub mod platform;
mod snapshot;
mod tracker;
mod types;

pub use snapshot::InputSnapshot;
pub use tracker::InputTracker;
pub use types::{InputEvent, InputId, KeyId, MouseButton};
