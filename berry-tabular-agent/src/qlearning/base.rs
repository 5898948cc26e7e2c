//! Tabular Q-learning agent.
use super::{EpsilonGreedy, QLearningConfig, Softmax, TabularExplorer};
use crate::util::{discrete_sizes, load_config, save_config, Table};
use anyhow::Result;
use berry_core::{
    error::BerryError,
    record::{Record, RecordValue},
    tuner::Trial,
    Agent, AgentCore, Env, Policy,
};
use log::{debug, info};
use std::path::Path;

/// Q-learning with a table of action values.
///
/// Training runs [`QLearningConfig::n_episodes`] episodes on the agent's environment,
/// acting with the configured explorer and applying
/// `Q(s, a) += lr * (r + gamma * max_b Q(s', b) - Q(s, a))` at every step, where the
/// bootstrap term is dropped at terminal states. The policy is greedy.
pub struct QLearningAgent<E: Env<Obs = usize, Act = usize>> {
    core: AgentCore<E>,
    config: QLearningConfig,
    q: Table,
    n_episodes_done: usize,
}

impl<E: Env<Obs = usize, Act = usize>> QLearningAgent<E> {
    /// The action values.
    pub fn q_table(&self) -> &Table {
        &self.q
    }

    /// The configuration of the agent.
    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }
}

impl<E: Env<Obs = usize, Act = usize>> Policy<E> for QLearningAgent<E> {
    fn policy(&mut self, obs: &usize) -> usize {
        self.q.argmax(*obs)
    }
}

impl<E: Env<Obs = usize, Act = usize>> Agent<E> for QLearningAgent<E> {
    type Config = QLearningConfig;
    const NAME: &'static str = "QLearning";
    const FIT_INFO: &'static [&'static str] = &["n_episodes", "episode_rewards"];

    fn build(core: AgentCore<E>, config: Self::Config) -> Result<Self> {
        let (n_states, n_actions) = discrete_sizes(&*core.env().borrow())?;
        Ok(Self {
            core,
            config,
            q: Table::zeros(n_states, n_actions),
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
        let gamma = self.config.gamma;
        let lr = self.config.learning_rate;
        let mut episode_rewards = Vec::with_capacity(self.config.n_episodes);

        for _ in 0..self.config.n_episodes {
            let episode = self.n_episodes_done;
            let mut obs = env.reset()?;
            let mut r_total = 0f32;

            for _ in 0..self.config.horizon {
                let act = self
                    .config
                    .explorer
                    .action(self.q.row(obs), episode, self.core.rng());
                let (step, _) = env.step(&act)?;
                let bootstrap = if step.is_terminated {
                    0.0
                } else {
                    gamma * self.q.max(step.obs)
                };
                let q = self.q.get_mut(obs, act);
                *q += lr * (step.reward + bootstrap - *q);

                r_total += step.reward;
                if step.is_done() {
                    break;
                }
                obs = step.obs;
            }

            debug!("Episode {}: reward = {}", episode, r_total);
            self.core.write(Record::from_slice(&[
                ("episode", RecordValue::Scalar(episode as f32)),
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
        self.q.fill_zero();
        self.n_episodes_done = 0;
    }

    fn save(&self, path: &Path) -> Result<()> {
        save_config(&self.config, path)?;
        self.q.save(path.join("q_table.bin"))?;
        Ok(())
    }

    fn load(path: &Path, core: AgentCore<E>) -> Result<Self> {
        let config = load_config(path)?;
        let mut agent = Self::build(core, config)?;
        let q = Table::load(path.join("q_table.bin"))?;
        if q.shape() != agent.q.shape() {
            return Err(BerryError::InvalidParameters(format!(
                "Q table of shape {:?} does not fit the environment {:?}",
                q.shape(),
                agent.q.shape()
            ))
            .into());
        }
        agent.q = q;
        Ok(agent)
    }

    fn sample_parameters(trial: &mut Trial, base: &Self::Config) -> Result<Self::Config> {
        let learning_rate = trial.suggest_loguniform("learning_rate", 1e-3, 1.0)?;
        let gamma = trial.suggest_categorical("gamma", &[0.9, 0.95, 0.99])?;
        let explorer = match &base.explorer {
            TabularExplorer::EpsilonGreedy(e) => {
                let eps_final = trial.suggest_float("eps_final", 0.0, 0.2)?;
                TabularExplorer::EpsilonGreedy(EpsilonGreedy {
                    eps_final: eps_final as f32,
                    ..e.clone()
                })
            }
            TabularExplorer::Softmax(_) => {
                let temperature = trial.suggest_loguniform("temperature", 0.01, 10.0)?;
                TabularExplorer::Softmax(Softmax {
                    temperature: temperature as f32,
                })
            }
        };

        Ok(base
            .clone()
            .learning_rate(learning_rate as f32)
            .gamma(gamma as f32)
            .explorer(explorer))
    }
}
