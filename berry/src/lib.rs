//! A reinforcement learning research library in Rust.
//!
//! Berry consists of the following crates:
//!
//! * Core
//!   * [berry-core](../berry_core/index.html) provides the traits of environments and
//!     agents, records, seeding, hyperparameter search and [`AgentStats`], which fits
//!     and compares several instances of an agent.
//!   * [berry-tensorboard](../berry_tensorboard/index.html) has `TensorboardRecorder`
//!     struct to write records which can be shown in Tensorboard.
//!     It is based on [tensorboard-rs](https://crates.io/crates/tensorboard-rs).
//! * Environment
//!   * [berry-finite-env](../berry_finite_env/index.html) includes finite MDPs, a chain
//!     and a grid world.
//! * Agent
//!   * [berry-tabular-agent](../berry_tabular_agent/index.html) includes Q-learning,
//!     value iteration, REINFORCE and a random agent on discrete spaces.
//!
//! This crate runs experiments described in YAML, see [`ExperimentConfig`], and
//! provides the `berry` command.
//!
//! [`AgentStats`]: berry_core::AgentStats
mod experiment;
pub use experiment::{run, AgentKind, AgentSpec, EnvSpec, ExperimentConfig, RunOptions};
