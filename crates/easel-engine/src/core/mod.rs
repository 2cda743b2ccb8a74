//! Core engine-facing contracts.
//!
//! [`Canvas`] is the drawing surface user code and components record into;
//! [`Engine`] adds frame delivery, input polling and component dispatch on
//! top of it. Programs receive `&mut Engine` from [`launch`](crate::launch).

mod canvas;
mod engine;

pub use canvas::Canvas;
pub use engine::Engine;
