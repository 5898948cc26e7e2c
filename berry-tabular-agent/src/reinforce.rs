//! Tabular REINFORCE agent.
mod base;
mod config;
pub use base::ReinforceAgent;
pub use config::ReinforceConfig;
