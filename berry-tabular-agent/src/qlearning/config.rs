//! Configuration of [`QLearningAgent`](super::QLearningAgent).
use super::{EpsilonGreedy, TabularExplorer};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`QLearningAgent`](super::QLearningAgent).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct QLearningConfig {
    /// Discount factor.
    pub gamma: f32,

    /// Step size of the updates.
    pub learning_rate: f32,

    /// Exploration during training.
    pub explorer: TabularExplorer,

    /// The number of training episodes.
    pub n_episodes: usize,

    /// The maximum length of a training episode.
    pub horizon: usize,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            gamma: 0.95,
            learning_rate: 0.1,
            explorer: TabularExplorer::EpsilonGreedy(EpsilonGreedy::default()),
            n_episodes: 200,
            horizon: 50,
        }
    }
}

impl QLearningConfig {
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

    /// Sets the explorer.
    pub fn explorer(mut self, v: TabularExplorer) -> Self {
        self.explorer = v;
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

    /// Constructs [`QLearningConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`QLearningConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
