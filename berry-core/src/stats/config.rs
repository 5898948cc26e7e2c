//! Configuration of [`AgentStats`](super::AgentStats).
use crate::AgentCoreConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`AgentStats`](super::AgentStats).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct AgentStatsConfig {
    /// The number of independently fitted agents.
    pub n_fit: usize,

    /// The maximum length of an evaluation episode.
    pub eval_horizon: usize,

    /// The number of evaluation episodes per agent.
    pub n_eval_episodes: usize,

    /// Discount factor used in evaluation.
    pub gamma: f32,

    /// Each agent works on a deep copy of the training environment.
    pub copy_env: bool,

    /// Each agent reseeds its environment.
    pub reseed_env: bool,

    /// Where agents are saved.
    pub output_dir: Option<String>,

    /// Global seed set before fitting, see [`seeding`](crate::seeding).
    pub seed: Option<u64>,
}

impl Default for AgentStatsConfig {
    fn default() -> Self {
        Self {
            n_fit: 4,
            eval_horizon: 100,
            n_eval_episodes: 10,
            gamma: 1.0,
            copy_env: true,
            reseed_env: true,
            output_dir: None,
            seed: None,
        }
    }
}

impl AgentStatsConfig {
    /// Sets the number of fitted agents.
    pub fn n_fit(mut self, v: usize) -> Self {
        self.n_fit = v;
        self
    }

    /// Sets the maximum length of an evaluation episode.
    pub fn eval_horizon(mut self, v: usize) -> Self {
        self.eval_horizon = v;
        self
    }

    /// Sets the number of evaluation episodes per agent.
    pub fn n_eval_episodes(mut self, v: usize) -> Self {
        self.n_eval_episodes = v;
        self
    }

    /// Sets the discount factor used in evaluation.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets whether agents copy the training environment.
    pub fn copy_env(mut self, v: bool) -> Self {
        self.copy_env = v;
        self
    }

    /// Sets whether agents reseed their environment.
    pub fn reseed_env(mut self, v: bool) -> Self {
        self.reseed_env = v;
        self
    }

    /// Sets the output directory.
    pub fn output_dir(mut self, v: impl Into<String>) -> Self {
        self.output_dir = Some(v.into());
        self
    }

    /// Sets the global seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = Some(v);
        self
    }

    /// How agents take the training environment.
    pub fn core_config(&self) -> AgentCoreConfig {
        AgentCoreConfig::default()
            .copy_env(self.copy_env)
            .reseed_env(self.reseed_env)
    }

    /// Constructs [`AgentStatsConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`AgentStatsConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_agent_stats_config() -> Result<()> {
        let config = AgentStatsConfig::default()
            .n_fit(2)
            .eval_horizon(30)
            .output_dir("some/directory")
            .seed(123);

        let dir = TempDir::new("agent_stats_config")?;
        let path = dir.path().join("agent_stats_config.yaml");
        config.save(&path)?;
        let config_ = AgentStatsConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_partial_yaml_uses_defaults() -> Result<()> {
        let config: AgentStatsConfig = serde_yaml::from_str("n_fit: 8\n")?;
        assert_eq!(config.n_fit, 8);
        assert_eq!(config.n_eval_episodes, 10);
        assert!(serde_yaml::from_str::<AgentStatsConfig>("n_fits: 8\n").is_err());
        Ok(())
    }
}
