//! Monte Carlo evaluation of a policy.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Env, Policy,
};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};

/// Configuration of [`DefaultEvaluator`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// The number of episodes.
    pub n_sim: usize,

    /// The maximum length of an episode.
    pub horizon: usize,

    /// Discount factor.
    pub gamma: f32,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            n_sim: 10,
            horizon: 100,
            gamma: 1.0,
        }
    }
}

/// Runs episodes of at most `horizon` steps and returns the discounted return of
/// each episode.
pub fn mc_policy_evaluation<E, P>(
    env: &mut E,
    policy: &mut P,
    horizon: usize,
    gamma: f32,
    n_sim: usize,
) -> Result<Vec<f32>>
where
    E: Env,
    P: Policy<E>,
{
    let mut returns = Vec::with_capacity(n_sim);

    for _ in 0..n_sim {
        let mut obs = env.reset()?;
        let mut discount = 1f32;
        let mut r_total = 0f32;

        for _ in 0..horizon {
            let act = policy.policy(&obs);
            let (step, _) = env.step(&act)?;
            r_total += discount * step.reward;
            discount *= gamma;
            if step.is_done() {
                break;
            }
            obs = step.obs;
        }
        returns.push(r_total);
    }

    Ok(returns)
}

/// Evaluates a policy by the average discounted return over a number of episodes.
///
/// The returned record has `"episode_return"`, the average, and
/// `"episode_returns"`, the return of each episode.
pub struct DefaultEvaluator<E: Env> {
    config: EvaluatorConfig,
    env: E,
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs an evaluator on its own environment.
    pub fn new(env: E, config: EvaluatorConfig) -> Self {
        Self { config, env }
    }

    /// Constructs an evaluator on an environment built from `env_config`.
    pub fn build(env_config: &E::Config, seed: u64, config: EvaluatorConfig) -> Result<Self> {
        Ok(Self::new(E::build(env_config, seed)?, config))
    }
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<Record> {
        let returns = mc_policy_evaluation(
            &mut self.env,
            policy,
            self.config.horizon,
            self.config.gamma,
            self.config.n_sim,
        )?;
        let mean = returns.iter().sum::<f32>() / returns.len().max(1) as f32;
        info!("Evaluation over {} episodes: mean return = {}", returns.len(), mean);

        Ok(Record::from_slice(&[
            ("episode_return", RecordValue::Scalar(mean)),
            ("episode_returns", RecordValue::Array1(returns)),
        ]))
    }
}
