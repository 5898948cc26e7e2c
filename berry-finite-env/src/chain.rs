//! Chain MDP.
use crate::{FiniteMdp, FiniteMdpConfig};
use anyhow::Result;
use berry_core::error::BerryError;
use serde::{Deserialize, Serialize};

/// Configuration of [`Chain`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    /// The number of states.
    pub length: usize,

    /// Probability of moving in the direction opposite to the action.
    pub fail_prob: f32,

    /// Episodes are truncated after this number of steps.
    pub horizon: Option<usize>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            length: 3,
            fail_prob: 0.0,
            horizon: Some(20),
        }
    }
}

impl ChainConfig {
    /// Sets the number of states.
    pub fn length(mut self, v: usize) -> Self {
        self.length = v;
        self
    }

    /// Sets the failure probability.
    pub fn fail_prob(mut self, v: f32) -> Self {
        self.fail_prob = v;
        self
    }

    /// Sets the horizon.
    pub fn horizon(mut self, v: Option<usize>) -> Self {
        self.horizon = v;
        self
    }
}

/// A chain of states `0..length` starting in state 0.
///
/// Action 0 moves right and action 1 moves left, except with probability
/// `fail_prob` where the move goes the other way. Any action taken in the last
/// state yields reward 1. There is no terminal state.
pub struct Chain;

impl Chain {
    /// Reward and transition tables of the chain.
    pub fn mdp_config(config: &ChainConfig) -> Result<FiniteMdpConfig> {
        let l = config.length;
        if l == 0 {
            return Err(BerryError::InvalidEnv("chain of length 0".to_string()).into());
        }
        if !(0.0..=1.0).contains(&config.fail_prob) {
            return Err(BerryError::InvalidEnv(format!(
                "fail_prob = {} is not a probability",
                config.fail_prob
            ))
            .into());
        }

        let right = |s: usize| (s + 1).min(l - 1);
        let left = |s: usize| s.saturating_sub(1);
        let mut rewards = vec![vec![0f32; 2]; l];
        let mut transitions = vec![vec![vec![0f32; l]; 2]; l];
        for s in 0..l {
            let moves = [(right(s), left(s)), (left(s), right(s))];
            for (a, (intended, opposite)) in moves.iter().enumerate() {
                transitions[s][a][*intended] += 1.0 - config.fail_prob;
                transitions[s][a][*opposite] += config.fail_prob;
            }
        }
        rewards[l - 1] = vec![1.0, 1.0];

        Ok(FiniteMdpConfig {
            rewards,
            transitions,
            initial_state_distribution: None,
            terminal_states: vec![],
            horizon: config.horizon,
        })
    }

    /// Builds the chain.
    pub fn build(config: &ChainConfig, seed: u64) -> Result<FiniteMdp> {
        FiniteMdp::new(&Self::mdp_config(config)?, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berry_core::{Env, FiniteModel};

    #[test]
    fn test_chain_moves() -> Result<()> {
        let mut env = Chain::build(&ChainConfig::default().length(4), 0)?;
        assert_eq!(env.reset()?, 0);
        assert_eq!(env.step(&1)?.0.obs, 0);
        assert_eq!(env.step(&0)?.0.obs, 1);
        assert_eq!(env.step(&0)?.0.obs, 2);
        assert_eq!(env.step(&0)?.0.obs, 3);
        let (step, _) = env.step(&0)?;
        assert_eq!((step.obs, step.reward), (3, 1.0));
        Ok(())
    }

    #[test]
    fn test_fail_prob_in_tables() -> Result<()> {
        let env = Chain::build(&ChainConfig::default().length(3).fail_prob(0.25), 0)?;
        assert_eq!(env.transition(1, 0), &[0.25, 0.0, 0.75]);
        assert_eq!(env.transition(0, 1), &[0.75, 0.25, 0.0]);
        assert_eq!(env.reward(2, 1), 1.0);
        assert!(Chain::build(&ChainConfig::default().fail_prob(1.5), 0).is_err());
        Ok(())
    }
}
