//! Retained draw stream.
//!
//! Responsibilities:
//! - store renderer-agnostic draw commands in issue order
//! - seed each new buffer with the style it starts from
//! - own the live/display buffer pair and its swap protocol

mod buffer;
mod cmd;
mod frames;

pub use buffer::CommandBuffer;
pub use cmd::{DrawCmd, ImageCmd};
pub use frames::{FramePair, SharedFrames, SwapMode};
