//! Evolutionary training and play modes for flapevo.
//!
//! This crate drives [`flapevo_engine::Engine`] with one of two
//! [`Simulation`](flapevo_engine::Simulation)s:
//!
//! - [`Trainer`] - evolves a population of policy-driven agents
//! - [`PlaySimulation`] - runs a single agent piloted by a trained policy or
//!   the keyboard
//!
//! [`TrainingController`] wraps both behind the commands a host exposes to
//! the user (start, pause, save).
//!
//! # Generation Lifecycle
//!
//! ```text
//! Spawning ──> Running ──> Extinct
//!    ^                        │
//!    └──────── restart ───────┘
//! ```
//!
//! 1. **Spawning** - each slot gets a policy bred from the previous dead pool
//!    (or a fresh one in the first generation); the first half of the slots
//!    are overwritten with the best-ever parameters
//! 2. **Running** - the course scrolls, agents decide and die; each dead agent
//!    moves from the live set to the dead pool
//! 3. **Extinct** - the fittest dead agent may become the new best-ever, the
//!    generation index advances, and the engine restarts
//!
//! See [`genetic`] for selection, crossover, and mutation.

pub use self::{controller::*, orchestrator::*, play::*, population::*, saved::*};

mod controller;
pub mod genetic;
mod orchestrator;
mod play;
mod population;
mod saved;
