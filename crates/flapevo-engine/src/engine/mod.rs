//! Simulation runtime: the frame clock, scene arena, and the objects that
//! live in it.
//!
//! - [`Engine`] - Fixed-step frame loop driving a [`Simulation`]
//! - [`Stage`] - Scene, event bus, course settings, and random source
//! - [`Scene`] - Insertion-ordered arena of [`SimObject`]s
//! - [`Agent`] / [`Obstacle`] - The two kinds of object on the course
//! - [`Clock`] - Injected-time frame scheduling
//!
//! # Frame Flow
//!
//! Each due frame runs these steps in order:
//!
//! 1. Clear the render surface and publish [`GameEvent::Update`]
//! 2. Call [`Simulation::on_update`] (typically the course tick)
//! 3. Update every live object; agents that crash are removed, their
//!    `Destroy` event is published and they are handed to
//!    [`Simulation::on_destroyed`]
//! 4. Publish [`GameEvent::Draw`] and draw every live object
//! 5. Call [`Simulation::after_frame`], which may request a restart

pub use self::{agent::*, clock::*, event::*, game::*, obstacle::*, scene::*};

mod agent;
mod clock;
mod event;
mod game;
mod obstacle;
mod scene;
