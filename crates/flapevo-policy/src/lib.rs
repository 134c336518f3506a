//! Decision policy backend for flapevo agents.
//!
//! [`MlpPolicy`] implements [`flapevo_engine::DecisionPolicy`] as a small dense
//! network evaluated on the CPU, and [`MlpFactory`] creates fresh or restored
//! instances for the trainer. The [`weights`] module holds the parameter
//! vector operations the policy is built from.
//!
//! # Architecture
//!
//! ```text
//! 5 inputs (agent y, gap top, gap bottom, obstacle x, velocity)
//!     ↓ dense + sigmoid
//! 8 hidden units
//!     ↓ dense + softmax
//! 2 outputs (flap, idle)
//! ```
//!
//! The agent flaps when the first output is greater than the second.

pub use self::mlp::*;

mod mlp;
pub mod weights;
