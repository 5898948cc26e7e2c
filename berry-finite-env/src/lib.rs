#![warn(missing_docs)]
//! Finite MDPs for [`berry_core`].
//!
//! [`FiniteMdp`] is a tabular MDP given by its reward and transition tables.
//! [`Chain`] and [`GridWorld`] build such tables.
mod chain;
mod finite_mdp;
mod gridworld;
pub use chain::{Chain, ChainConfig};
pub use finite_mdp::{FiniteMdp, FiniteMdpConfig};
pub use gridworld::{GridWorld, GridWorldConfig};
