//! REINFORCE with a softmax policy over a table of preferences.
use super::ReinforceConfig;
use crate::util::{discrete_sizes, load_config, save_config, softmax, Table};
use anyhow::Result;
use berry_core::{
    error::BerryError,
    record::{Record, RecordValue},
    tuner::Trial,
    Agent, AgentCore, Env, Policy,
};
use log::{debug, info};
use rand::{distributions::WeightedIndex, Rng};
use std::path::Path;

/// Monte Carlo policy gradient.
///
/// The policy is `pi(a | s) = softmax(theta[s])[a]`. After each episode,
/// `theta[s_t] += lr * G_t * (onehot(a_t) - pi(. | s_t))` for every step `t`,
/// where `G_t` is the discounted return from `t`. The policy is stochastic,
/// also after training.
pub struct ReinforceAgent<E: Env<Obs = usize, Act = usize>> {
    core: AgentCore<E>,
    config: ReinforceConfig,
    theta: Table,
    n_episodes_done: usize,
}

fn sample_action(p: &[f32], rng: &mut impl Rng) -> usize {
    match WeightedIndex::new(p) {
        Ok(dist) => rng.sample(dist),
        Err(_) => crate::util::argmax(p),
    }
}

/// Discounted returns `G_t = r_t + gamma * G_{t+1}`.
fn discounted_returns(rewards: &[f32], gamma: f32) -> Vec<f32> {
    let mut returns = vec![0f32; rewards.len()];
    let mut g = 0f32;
    for t in (0..rewards.len()).rev() {
        g = rewards[t] + gamma * g;
        returns[t] = g;
    }
    returns
}

fn standardize(v: &mut [f32]) {
    if v.len() < 2 {
        return;
    }
    let n = v.len() as f32;
    let mean = v.iter().sum::<f32>() / n;
    let std = (v.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n).sqrt();
    if std > f32::EPSILON {
        v.iter_mut().for_each(|x| *x = (*x - mean) / std);
    }
}

impl<E: Env<Obs = usize, Act = usize>> ReinforceAgent<E> {
    /// Action probabilities in a state.
    pub fn action_probs(&self, obs: usize) -> Vec<f32> {
        softmax(self.theta.row(obs), 1.0)
    }

    fn update(&mut self, trajectory: &[(usize, usize)], returns: &[f32]) {
        let lr = self.config.learning_rate;
        for (&(s, a), g) in trajectory.iter().zip(returns.iter()) {
            let p = self.action_probs(s);
            for (b, pb) in p.iter().enumerate() {
                let indicator = if a == b { 1.0 } else { 0.0 };
                *self.theta.get_mut(s, b) += lr * g * (indicator - pb);
            }
        }
    }
}

impl<E: Env<Obs = usize, Act = usize>> Policy<E> for ReinforceAgent<E> {
    fn policy(&mut self, obs: &usize) -> usize {
        let p = self.action_probs(*obs);
        sample_action(&p, self.core.rng())
    }
}

impl<E: Env<Obs = usize, Act = usize>> Agent<E> for ReinforceAgent<E> {
    type Config = ReinforceConfig;
    const NAME: &'static str = "Reinforce";
    const FIT_INFO: &'static [&'static str] = &["n_episodes", "episode_rewards"];

    fn build(core: AgentCore<E>, config: Self::Config) -> Result<Self> {
        let (n_states, n_actions) = discrete_sizes(&*core.env().borrow())?;
        Ok(Self {
            core,
            config,
            theta: Table::zeros(n_states, n_actions),
            n_episodes_done: 0,
        })
    }

    fn core(&self) -> &AgentCore<E> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore<E> {
        &mut self.core
    }

    /// Runs the training episodes.
    ///
    /// Each episode sends `episode` and `episode_reward` to the writer.
    fn fit(&mut self) -> Result<Record> {
        let env = self.core.env();
        let mut env = env.borrow_mut();
        let mut episode_rewards = Vec::with_capacity(self.config.n_episodes);

        for _ in 0..self.config.n_episodes {
            let mut obs = env.reset()?;
            let mut trajectory = vec![];
            let mut rewards = vec![];

            for _ in 0..self.config.horizon {
                let act = self.policy(&obs);
                let (step, _) = env.step(&act)?;
                trajectory.push((obs, act));
                rewards.push(step.reward);
                if step.is_done() {
                    break;
                }
                obs = step.obs;
            }

            let mut returns = discounted_returns(&rewards, self.config.gamma);
            if self.config.normalize_returns {
                standardize(&mut returns);
            }
            self.update(&trajectory, &returns);

            let r_total: f32 = rewards.iter().sum();
            debug!("Episode {}: reward = {}", self.n_episodes_done, r_total);
            self.core.write(Record::from_slice(&[
                ("episode", RecordValue::Scalar(self.n_episodes_done as f32)),
                ("episode_reward", RecordValue::Scalar(r_total)),
            ]));
            episode_rewards.push(r_total);
            self.n_episodes_done += 1;
        }
        info!(
            "{} finished {} episodes",
            self.core.name(),
            self.config.n_episodes
        );

        Ok(Record::from_slice(&[
            ("n_episodes", RecordValue::Scalar(self.config.n_episodes as f32)),
            ("episode_rewards", RecordValue::Array1(episode_rewards)),
        ]))
    }

    fn reset(&mut self) {
        self.theta.fill_zero();
        self.n_episodes_done = 0;
    }

    fn save(&self, path: &Path) -> Result<()> {
        save_config(&self.config, path)?;
        self.theta.save(path.join("theta.bin"))
    }

    fn load(path: &Path, core: AgentCore<E>) -> Result<Self> {
        let config = load_config(path)?;
        let mut agent = Self::build(core, config)?;
        let theta = Table::load(path.join("theta.bin"))?;
        if theta.shape() != agent.theta.shape() {
            return Err(BerryError::InvalidParameters(
                "policy table does not fit the environment".to_string(),
            )
            .into());
        }
        agent.theta = theta;
        Ok(agent)
    }

    fn sample_parameters(trial: &mut Trial, base: &Self::Config) -> Result<Self::Config> {
        let learning_rate = trial.suggest_loguniform("learning_rate", 1e-3, 1.0)?;
        let gamma = trial.suggest_categorical("gamma", &[0.9, 0.95, 0.99])?;
        let normalize = trial.suggest_categorical("normalize_returns", &["true", "false"])?;

        Ok(base
            .clone()
            .learning_rate(learning_rate as f32)
            .gamma(gamma as f32)
            .normalize_returns(normalize == "true"))
    }
}
