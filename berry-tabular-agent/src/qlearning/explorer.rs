//! Exploration strategies of tabular agents.
use crate::util::{argmax, softmax};
use rand::{distributions::WeightedIndex, Rng};
use serde::{Deserialize, Serialize};

/// Explorers for tabular agents.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum TabularExplorer {
    /// Softmax action selection.
    Softmax(Softmax),

    /// Epsilon-greedy action selection.
    EpsilonGreedy(EpsilonGreedy),
}

impl Default for TabularExplorer {
    fn default() -> Self {
        TabularExplorer::EpsilonGreedy(EpsilonGreedy::default())
    }
}

impl TabularExplorer {
    /// Takes an action based on the action values of the current state.
    ///
    /// * `values` - action values.
    /// * `episode` - index of the current training episode.
    pub fn action(&self, values: &[f32], episode: usize, rng: &mut impl Rng) -> usize {
        match self {
            TabularExplorer::Softmax(s) => s.action(values, rng),
            TabularExplorer::EpsilonGreedy(e) => e.action(values, episode, rng),
        }
    }
}

/// Softmax explorer.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Softmax {
    /// Temperature.
    pub temperature: f32,
}

impl Default for Softmax {
    fn default() -> Self {
        Self { temperature: 1.0 }
    }
}

impl Softmax {
    /// Samples an action from the softmax of the action values.
    pub fn action(&self, values: &[f32], rng: &mut impl Rng) -> usize {
        let p = softmax(values, self.temperature);
        match WeightedIndex::new(&p) {
            Ok(dist) => rng.sample(dist),
            Err(_) => argmax(values),
        }
    }
}

/// Epsilon-greedy explorer whose epsilon decays linearly over episodes.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Epsilon of the first episode.
    pub eps_start: f32,

    /// Epsilon after `final_episode` episodes.
    pub eps_final: f32,

    /// The number of episodes over which epsilon decays.
    pub final_episode: usize,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps_start: 1.0,
            eps_final: 0.05,
            final_episode: 100,
        }
    }
}

impl EpsilonGreedy {
    /// A constant epsilon.
    pub fn constant(eps: f32) -> Self {
        Self {
            eps_start: eps,
            eps_final: eps,
            final_episode: 1,
        }
    }

    /// Epsilon at the given episode.
    pub fn epsilon(&self, episode: usize) -> f32 {
        if episode >= self.final_episode {
            return self.eps_final;
        }
        let d = (self.eps_start - self.eps_final) / self.final_episode as f32;
        self.eps_start - d * episode as f32
    }

    /// Takes a uniformly random action with probability epsilon, otherwise a greedy one.
    pub fn action(&self, values: &[f32], episode: usize, rng: &mut impl Rng) -> usize {
        if rng.gen::<f32>() < self.epsilon(episode) {
            rng.gen_range(0..values.len())
        } else {
            argmax(values)
        }
    }
}
