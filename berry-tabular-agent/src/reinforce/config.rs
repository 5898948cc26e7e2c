//! Configuration of [`ReinforceAgent`](super::ReinforceAgent).
use serde::{Deserialize, Serialize};

/// Configuration of [`ReinforceAgent`](super::ReinforceAgent).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct ReinforceConfig {
    /// Discount factor.
    pub gamma: f32,

    /// Step size of the gradient ascent.
    pub learning_rate: f32,

    /// The number of training episodes.
    pub n_episodes: usize,

    /// The maximum length of a training episode.
    pub horizon: usize,

    /// Standardizes the returns of an episode before the update.
    pub normalize_returns: bool,
}

impl Default for ReinforceConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            learning_rate: 0.1,
            n_episodes: 200,
            horizon: 50,
            normalize_returns: true,
        }
    }
}

impl ReinforceConfig {
    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the learning rate.
    pub fn learning_rate(mut self, v: f32) -> Self {
        self.learning_rate = v;
        self
    }

    /// Sets the number of training episodes.
    pub fn n_episodes(mut self, v: usize) -> Self {
        self.n_episodes = v;
        self
    }

    /// Sets the maximum length of a training episode.
    pub fn horizon(mut self, v: usize) -> Self {
        self.horizon = v;
        self
    }

    /// Sets whether returns are standardized.
    pub fn normalize_returns(mut self, v: bool) -> Self {
        self.normalize_returns = v;
        self
    }
}
