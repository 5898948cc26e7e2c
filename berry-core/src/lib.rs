#![warn(missing_docs)]
//! Core of a library for reinforcement learning research.
//!
//! [`Agent`] is the interface every agent implements, so that agents can be
//! driven interchangeably by [`AgentStats`], tuned with [`tuner`], and logged
//! through a writer implementing [`record::Recorder`].
pub mod error;
pub mod evaluator;
pub mod record;
pub mod seeding;
pub mod tuner;

mod base;
pub use base::{
    check_fit_info, parse_config, Agent, AgentCore, AgentCoreConfig, Env, EnvHandle,
    FiniteModel, Policy, Space, SpaceSample, Step,
};

mod stats;
pub use stats::{compare_policies, AgentStats, AgentStatsConfig, PolicyStats, PolicySummary, WriterFactory};
