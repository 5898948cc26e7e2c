//! Experiments described in YAML.
use anyhow::Result;
use berry_core::{
    compare_policies, error::BerryError, parse_config, seeding, Agent, AgentStats,
    AgentStatsConfig, PolicyStats, PolicySummary,
};
use berry_finite_env::{Chain, ChainConfig, FiniteMdp, FiniteMdpConfig, GridWorld, GridWorldConfig};
use berry_tabular_agent::{QLearningAgent, RandomAgent, ReinforceAgent, ValueIterationAgent};
use berry_tensorboard::TensorboardRecorder;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Environment of an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvSpec {
    /// See [`Chain`].
    Chain(ChainConfig),

    /// See [`GridWorld`].
    GridWorld(GridWorldConfig),

    /// A finite MDP given by its tables.
    FiniteMdp(FiniteMdpConfig),
}

impl EnvSpec {
    /// Builds the environment.
    pub fn build(&self, seed: u64) -> Result<FiniteMdp> {
        match self {
            EnvSpec::Chain(config) => Chain::build(config, seed),
            EnvSpec::GridWorld(config) => GridWorld::build(config, seed),
            EnvSpec::FiniteMdp(config) => FiniteMdp::new(config, seed),
        }
    }
}

/// Agents available in experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentKind {
    /// [`QLearningAgent`]
    QLearning,

    /// [`ValueIterationAgent`]
    ValueIteration,

    /// [`ReinforceAgent`]
    Reinforce,

    /// [`RandomAgent`]
    Random,
}

/// An agent and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSpec {
    /// The agent.
    pub agent: AgentKind,

    /// Fields of the agent config. Missing fields take their default values;
    /// unknown fields are an error.
    #[serde(default)]
    pub params: serde_yaml::Value,
}

/// Configuration of an experiment.
///
/// ```yaml
/// env:
///   chain:
///     length: 5
/// agents:
///   - agent: QLearning
///     params:
///       n_episodes: 100
///   - agent: Random
/// stats:
///   n_fit: 2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    /// Training environment.
    pub env: EnvSpec,

    /// Evaluation environment, the training environment if not given.
    #[serde(default)]
    pub eval_env: Option<EnvSpec>,

    /// Agents to be compared.
    pub agents: Vec<AgentSpec>,

    /// Configuration of the runner of each agent.
    #[serde(default)]
    pub stats: AgentStatsConfig,
}

impl ExperimentConfig {
    /// Constructs [`ExperimentConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ExperimentConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Options of [`run`] given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The number of hyperparameter optimization trials before fitting.
    pub n_trials: Option<usize>,

    /// Directory of Tensorboard logs.
    pub logdir: Option<PathBuf>,
}

/// Fits, evaluates and saves the agents of an experiment.
///
/// Returns the evaluation summary of each agent, in the order of
/// [`ExperimentConfig::agents`].
pub fn run(config: &ExperimentConfig, opts: &RunOptions) -> Result<Vec<PolicySummary>> {
    if config.agents.is_empty() {
        return Err(BerryError::InvalidParameters("no agent in the experiment".to_string()).into());
    }
    let seed = config.stats.seed.unwrap_or_else(seeding::spawn_seed);
    let train_env = config.env.build(seed)?;
    let eval_env = config
        .eval_env
        .as_ref()
        .unwrap_or(&config.env)
        .build(seed.wrapping_add(1))?;

    let mut runners: Vec<Box<dyn PolicyStats>> = vec![];
    for spec in config.agents.iter() {
        let runner = match spec.agent {
            AgentKind::QLearning => {
                fit_agent::<QLearningAgent<FiniteMdp>>(spec, &train_env, &eval_env, config, opts)?
            }
            AgentKind::ValueIteration => fit_agent::<ValueIterationAgent<FiniteMdp>>(
                spec, &train_env, &eval_env, config, opts,
            )?,
            AgentKind::Reinforce => {
                fit_agent::<ReinforceAgent<FiniteMdp>>(spec, &train_env, &eval_env, config, opts)?
            }
            AgentKind::Random => {
                fit_agent::<RandomAgent<FiniteMdp>>(spec, &train_env, &eval_env, config, opts)?
            }
        };
        runners.push(runner);
    }

    let mut stats: Vec<&mut dyn PolicyStats> = vec![];
    for runner in runners.iter_mut() {
        stats.push(runner.as_mut());
    }
    compare_policies(&mut stats)
}

fn fit_agent<A>(
    spec: &AgentSpec,
    train_env: &FiniteMdp,
    eval_env: &FiniteMdp,
    config: &ExperimentConfig,
    opts: &RunOptions,
) -> Result<Box<dyn PolicyStats>>
where
    A: Agent<FiniteMdp> + 'static,
{
    let agent_config = parse_config::<A::Config>(&spec.params)?;
    let mut stats = AgentStats::<FiniteMdp, A>::new(
        train_env.clone(),
        eval_env.clone(),
        agent_config,
        config.stats.clone(),
    );

    if let Some(logdir) = opts.logdir.as_ref() {
        let logdir = logdir.join(A::NAME);
        stats = stats.writer_factory(move |i| {
            Box::new(TensorboardRecorder::new(
                logdir.join(format!("fit_{}", i)),
                "episode",
            ))
        });
    }

    if let Some(n_trials) = opts.n_trials {
        match stats.optimize_hyperparams(n_trials) {
            Ok(best) => info!("{}: best config {:?}", A::NAME, best),
            Err(e) => match e.downcast_ref::<BerryError>() {
                Some(BerryError::NotImplemented(_)) => {
                    warn!("{} has no hyperparameter to optimize: {}", A::NAME, e)
                }
                _ => return Err(e),
            },
        }
    }

    stats.fit()?;
    info!("{}: {:?}", A::NAME, stats.fit_summary());
    stats.save()?;
    Ok(Box::new(stats))
}
