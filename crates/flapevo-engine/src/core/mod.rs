//! Core data structures shared by the simulation and its hosts.
//!
//! - [`CourseConfig`] - Course dimensions and physics constants
//! - [`Rect`] - Axis-aligned rectangle used for bounds and drawing
//! - [`EventBus`] - Keyed publish/subscribe dispatch
//! - [`DecisionPolicy`] - Capability interface for the agent's decision model
//! - [`RenderSurface`] - Drawing target for scene objects
//!
//! Nothing in this module knows about generations or breeding; see the
//! `flapevo-training` crate for that.

pub use self::{config::*, event_bus::*, geometry::*, policy::*, render::*};

mod config;
mod event_bus;
mod geometry;
mod policy;
mod render;
