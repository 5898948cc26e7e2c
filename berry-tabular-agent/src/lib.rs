#![warn(missing_docs)]
//! Agents on environments with discrete observations and actions.
//!
//! Every agent implements [`berry_core::Agent`] for environments whose
//! observations and actions are `usize` indices of discrete spaces.
pub mod qlearning;
mod random;
pub mod reinforce;
pub mod util;
mod value_iteration;
pub use qlearning::{QLearningAgent, QLearningConfig};
pub use random::{RandomAgent, RandomConfig};
pub use reinforce::{ReinforceAgent, ReinforceConfig};
pub use value_iteration::{ValueIterationAgent, ValueIterationConfig};
