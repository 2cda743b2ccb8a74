//! Time subsystem.
//!
//! Provides frame pacing without coupling to any backend.
//! Intended usage:
//! - one `FramePacer` per engine
//! - call `pace()` once per delivered frame to obtain `FrameTime`

mod pacer;

pub use pacer::{wait_for_fps, FramePacer, FrameTime};
