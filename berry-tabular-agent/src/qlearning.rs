//! Tabular Q-learning agent.
mod base;
mod config;
mod explorer;
pub use base::QLearningAgent;
pub use config::QLearningConfig;
pub use explorer::{EpsilonGreedy, Softmax, TabularExplorer};
