//! Tabular MDP.
use anyhow::Result;
use berry_core::{
    error::BerryError,
    record::{Record, RecordValue},
    seeding, Env, FiniteModel, Space, Step,
};
use log::trace;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const PROB_TOLERANCE: f32 = 1e-4;

/// Configuration of [`FiniteMdp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct FiniteMdpConfig {
    /// `rewards[s][a]`: reward of taking action `a` in state `s`.
    pub rewards: Vec<Vec<f32>>,

    /// `transitions[s][a][s']`: probability of moving to `s'`.
    pub transitions: Vec<Vec<Vec<f32>>>,

    /// Distribution of the first state. `None` starts in state 0.
    pub initial_state_distribution: Option<Vec<f32>>,

    /// States ending an episode when reached.
    pub terminal_states: Vec<usize>,

    /// Episodes are truncated after this number of steps.
    pub horizon: Option<usize>,
}

/// A tabular MDP with states `0..n_states` and actions `0..n_actions`.
///
/// Rewards are deterministic functions of the state and the action.
#[derive(Debug, Clone)]
pub struct FiniteMdp {
    n_states: usize,
    n_actions: usize,
    rewards: Vec<f32>,
    transitions: Vec<f32>,
    initial_state_distribution: Vec<f32>,
    is_terminal: Vec<bool>,
    horizon: Option<usize>,
    state: usize,
    t: usize,
    rng: SmallRng,
    observation_space: Space,
    action_space: Space,
}

fn invalid(msg: String) -> anyhow::Error {
    BerryError::InvalidEnv(msg).into()
}

fn check_distribution(p: &[f32], what: &str) -> Result<()> {
    let sum: f32 = p.iter().sum();
    let valid = p.iter().all(|v| v.is_finite() && *v >= 0.0);
    if !valid || !((sum - 1.0).abs() <= PROB_TOLERANCE) {
        return Err(invalid(format!("{} is not a distribution: {:?}", what, p)));
    }
    Ok(())
}

/// Draws an index from a discrete distribution.
pub(crate) fn sample_categorical<R: Rng + ?Sized>(p: &[f32], rng: &mut R) -> usize {
    let u: f32 = rng.gen();
    let mut acc = 0f32;
    for (i, v) in p.iter().enumerate() {
        acc += v;
        if u < acc {
            return i;
        }
    }
    // rounding: fall back on the last index with positive mass
    p.iter().rposition(|v| *v > 0.0).unwrap_or(0)
}

impl FiniteMdp {
    /// Builds the MDP, checking the consistency of the tables.
    pub fn new(config: &FiniteMdpConfig, seed: u64) -> Result<Self> {
        let n_states = config.rewards.len();
        if n_states == 0 {
            return Err(invalid("no state".to_string()));
        }
        let n_actions = config.rewards[0].len();
        if n_actions == 0 {
            return Err(invalid("no action".to_string()));
        }
        if config.transitions.len() != n_states {
            return Err(invalid(format!(
                "{} reward rows but {} transition rows",
                n_states,
                config.transitions.len()
            )));
        }

        let mut rewards = Vec::with_capacity(n_states * n_actions);
        let mut transitions = Vec::with_capacity(n_states * n_actions * n_states);
        for s in 0..n_states {
            if config.rewards[s].len() != n_actions || config.transitions[s].len() != n_actions {
                return Err(invalid(format!("state {} does not have {} actions", s, n_actions)));
            }
            rewards.extend_from_slice(&config.rewards[s]);
            for a in 0..n_actions {
                let p = &config.transitions[s][a];
                if p.len() != n_states {
                    return Err(invalid(format!("P[{}][{}] has length {}", s, a, p.len())));
                }
                check_distribution(p, &format!("P[{}][{}]", s, a))?;
                transitions.extend_from_slice(p);
            }
        }

        let initial_state_distribution = match &config.initial_state_distribution {
            Some(p) => {
                if p.len() != n_states {
                    return Err(invalid("initial state distribution has a wrong length".to_string()));
                }
                check_distribution(p, "initial state distribution")?;
                p.clone()
            }
            None => {
                let mut p = vec![0f32; n_states];
                p[0] = 1.0;
                p
            }
        };

        let mut is_terminal = vec![false; n_states];
        for s in config.terminal_states.iter() {
            if *s >= n_states {
                return Err(invalid(format!("terminal state {} out of range", s)));
            }
            is_terminal[*s] = true;
        }

        Ok(Self {
            n_states,
            n_actions,
            rewards,
            transitions,
            initial_state_distribution,
            is_terminal,
            horizon: config.horizon,
            state: 0,
            t: 0,
            rng: SmallRng::seed_from_u64(seed),
            observation_space: Space::discrete(n_states),
            action_space: Space::discrete(n_actions),
        })
    }

    /// The current state.
    pub fn state(&self) -> usize {
        self.state
    }

    fn check_state_action(&self, state: usize, action: usize) -> Result<()> {
        if state >= self.n_states || action >= self.n_actions {
            return Err(invalid(format!(
                "(state, action) = ({}, {}) out of range",
                state, action
            )));
        }
        Ok(())
    }

    fn transit(&mut self, state: usize, action: usize) -> Result<(usize, f32)> {
        self.check_state_action(state, action)?;
        let i = (state * self.n_actions + action) * self.n_states;
        let next = sample_categorical(&self.transitions[i..i + self.n_states], &mut self.rng);
        Ok((next, self.rewards[state * self.n_actions + action]))
    }
}

impl Env for FiniteMdp {
    type Config = FiniteMdpConfig;
    type Obs = usize;
    type Act = usize;

    fn build(config: &Self::Config, seed: u64) -> Result<Self> {
        Self::new(config, seed)
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn reward_range(&self) -> (f32, f32) {
        let min = self.rewards.iter().copied().fold(f32::INFINITY, f32::min);
        let max = self.rewards.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        (min, max)
    }

    fn reseed(&mut self, seed: Option<u64>) {
        self.rng = seeding::rng_from_seed(seed);
    }

    fn reset(&mut self) -> Result<usize> {
        self.state = sample_categorical(&self.initial_state_distribution, &mut self.rng);
        self.t = 0;
        Ok(self.state)
    }

    fn step(&mut self, act: &usize) -> Result<(Step<Self>, Record)> {
        let (next, reward) = self.transit(self.state, *act)?;
        trace!("{} --{}--> {} (r = {})", self.state, act, next, reward);
        self.state = next;
        self.t += 1;
        let is_terminated = self.is_terminal[next];
        let is_truncated = self.horizon.map_or(false, |h| self.t >= h);
        let record = Record::from_slice(&[("t", RecordValue::Scalar(self.t as f32))]);
        Ok((
            Step::new(next, *act, reward, is_terminated, is_truncated),
            record,
        ))
    }

    fn is_generative(&self) -> bool {
        true
    }

    fn sample(&mut self, obs: &usize, act: &usize) -> Result<(Step<Self>, Record)> {
        let (next, reward) = self.transit(*obs, *act)?;
        let step = Step::new(next, *act, reward, self.is_terminal[next], false);
        Ok((step, Record::empty()))
    }
}

impl FiniteModel for FiniteMdp {
    fn n_states(&self) -> usize {
        self.n_states
    }

    fn n_actions(&self) -> usize {
        self.n_actions
    }

    fn transition(&self, state: usize, action: usize) -> &[f32] {
        let i = (state * self.n_actions + action) * self.n_states;
        &self.transitions[i..i + self.n_states]
    }

    fn reward(&self, state: usize, action: usize) -> f32 {
        self.rewards[state * self.n_actions + action]
    }

    fn is_terminal(&self, state: usize) -> bool {
        self.is_terminal[state]
    }
}
