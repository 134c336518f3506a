//! Minimal terminal application runtime.
//!
//! Unlike a fixed-rate game loop, the runtime asks the application when it
//! next wants an update, so the simulation clock stays the single source of
//! frame timing.

mod app;
mod event;
mod event_loop;
mod runtime;

pub use self::{app::App, event_loop::RenderMode, runtime::Runtime};
