//! Value iteration.
use crate::util::{load_config, save_config, Table};
use anyhow::Result;
use berry_core::{
    error::BerryError,
    record::{Record, RecordValue},
    Agent, AgentCore, Env, FiniteModel, Policy,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of [`ValueIterationAgent`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct ValueIterationConfig {
    /// Discount factor.
    pub gamma: f32,

    /// Iterations stop when values change by less than this amount.
    pub epsilon: f32,

    /// Upper bound on the number of iterations.
    pub max_iterations: usize,
}

impl Default for ValueIterationConfig {
    fn default() -> Self {
        Self {
            gamma: 0.95,
            epsilon: 1e-5,
            max_iterations: 10_000,
        }
    }
}

/// Plans on a known finite MDP with value iteration. The policy is greedy with
/// respect to the computed action values.
pub struct ValueIterationAgent<E>
where
    E: Env<Obs = usize, Act = usize> + FiniteModel,
{
    core: AgentCore<E>,
    config: ValueIterationConfig,
    q: Table,
    v: Vec<f32>,
}

impl<E> ValueIterationAgent<E>
where
    E: Env<Obs = usize, Act = usize> + FiniteModel,
{
    /// The action values.
    pub fn q_table(&self) -> &Table {
        &self.q
    }

    /// The state values.
    pub fn values(&self) -> &[f32] {
        &self.v
    }

    /// One Bellman backup of every action value. Returns `max |V' - V|`.
    fn backup(&mut self, model: &E) -> f32 {
        let (n_states, n_actions) = self.q.shape();
        let gamma = self.config.gamma;
        for s in 0..n_states {
            for a in 0..n_actions {
                let expected_next: f32 = model
                    .transition(s, a)
                    .iter()
                    .enumerate()
                    .filter(|(next, _)| !model.is_terminal(*next))
                    .map(|(next, p)| p * self.v[next])
                    .sum();
                *self.q.get_mut(s, a) = model.reward(s, a) + gamma * expected_next;
            }
        }

        let mut delta = 0f32;
        for s in 0..n_states {
            let v = if model.is_terminal(s) { 0.0 } else { self.q.max(s) };
            delta = delta.max((v - self.v[s]).abs());
            self.v[s] = v;
        }
        delta
    }
}

impl<E> Policy<E> for ValueIterationAgent<E>
where
    E: Env<Obs = usize, Act = usize> + FiniteModel,
{
    fn policy(&mut self, obs: &usize) -> usize {
        self.q.argmax(*obs)
    }
}

impl<E> Agent<E> for ValueIterationAgent<E>
where
    E: Env<Obs = usize, Act = usize> + FiniteModel,
{
    type Config = ValueIterationConfig;
    const NAME: &'static str = "ValueIteration";
    const FIT_INFO: &'static [&'static str] = &["n_iterations", "precision"];

    fn build(core: AgentCore<E>, config: Self::Config) -> Result<Self> {
        if !(0.0..1.0).contains(&config.gamma) {
            return Err(BerryError::InvalidParameters(format!(
                "gamma = {} must be in [0, 1)",
                config.gamma
            ))
            .into());
        }
        let (n_states, n_actions) = {
            let env = core.env();
            let env = env.borrow();
            (env.n_states(), env.n_actions())
        };
        Ok(Self {
            core,
            config,
            q: Table::zeros(n_states, n_actions),
            v: vec![0f32; n_states],
        })
    }

    fn core(&self) -> &AgentCore<E> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore<E> {
        &mut self.core
    }

    /// Iterates until the values change by less than `epsilon`.
    ///
    /// Each iteration sends `iteration` and `precision` to the writer.
    fn fit(&mut self) -> Result<Record> {
        let env = self.core.env();
        let model = env.borrow();
        let mut n_iterations = 0;
        let mut precision = f32::INFINITY;

        while n_iterations < self.config.max_iterations {
            precision = self.backup(&model);
            n_iterations += 1;
            self.core.write(Record::from_slice(&[
                ("iteration", RecordValue::Scalar(n_iterations as f32)),
                ("precision", RecordValue::Scalar(precision)),
            ]));
            if precision < self.config.epsilon {
                break;
            }
        }
        if precision >= self.config.epsilon {
            warn!(
                "Value iteration stopped after {} iterations with precision {}",
                n_iterations, precision
            );
        } else {
            info!("Value iteration converged in {} iterations", n_iterations);
        }

        Ok(Record::from_slice(&[
            ("n_iterations", RecordValue::Scalar(n_iterations as f32)),
            ("precision", RecordValue::Scalar(precision)),
        ]))
    }

    fn reset(&mut self) {
        self.q.fill_zero();
        self.v.iter_mut().for_each(|v| *v = 0.0);
    }

    fn save(&self, path: &Path) -> Result<()> {
        save_config(&self.config, path)?;
        self.q.save(path.join("q_table.bin"))
    }

    fn load(path: &Path, core: AgentCore<E>) -> Result<Self> {
        let config = load_config(path)?;
        let mut agent = Self::build(core, config)?;
        let q = Table::load(path.join("q_table.bin"))?;
        if q.shape() != agent.q.shape() {
            return Err(BerryError::InvalidParameters(
                "Q table does not fit the environment".to_string(),
            )
            .into());
        }
        agent.v = {
            let env = agent.core.env();
            let model = env.borrow();
            (0..q.shape().0)
                .map(|s| if model.is_terminal(s) { 0.0 } else { q.max(s) })
                .collect()
        };
        agent.q = q;
        Ok(agent)
    }
}
