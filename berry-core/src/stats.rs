//! Fit, evaluate, save and tune a number of independent [`Agent`]s.
mod config;
use crate::{
    error::BerryError,
    evaluator::{DefaultEvaluator, Evaluator, EvaluatorConfig},
    record::{Record, RecordStorage, RecordValue, Recorder},
    seeding,
    tuner::Study,
    Agent, AgentCore, Env,
};
use anyhow::Result;
use chrono::Local;
pub use config::AgentStatsConfig;
use log::{info, warn};
use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

/// Creates the writer of the `i`-th fitted agent.
pub type WriterFactory = Box<dyn FnMut(usize) -> Box<dyn Recorder>>;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Runs an experiment with several independently fitted agents of the same kind.
///
/// ```mermaid
/// graph LR
///     A[AgentStats]-->|"AgentCore (copied, reseeded env)"|B[Agent]
///     A -->|writer| B
///     B -->|"fit() record"|A
///     A -->|policy|C[DefaultEvaluator]
///     C -->|episode_return|A
/// ```
///
/// * [`AgentStats::fit`] builds `n_fit` agents from the same config. Each agent
///   gets the training environment through [`AgentCore`], so that it is copied
///   and reseeded as configured, and a writer from the writer factory if any.
/// * [`AgentStats::eval`] evaluates every fitted agent on a copy of the
///   evaluation environment.
/// * [`AgentStats::optimize_hyperparams`] samples configs with
///   [`Agent::sample_parameters`] and keeps the one with the best evaluation.
pub struct AgentStats<E, A>
where
    E: Env,
    A: Agent<E>,
{
    config: AgentStatsConfig,
    train_env: EnvSlot<E>,
    eval_env: E,
    agent_config: A::Config,
    writer_factory: Option<WriterFactory>,
    agents: Vec<A>,
    fit_records: Vec<Record>,
}

/// The training environment, shared by all agents when they do not copy it.
type EnvSlot<E> = Rc<RefCell<E>>;

impl<E, A> AgentStats<E, A>
where
    E: Env,
    A: Agent<E>,
{
    /// Constructs the runner.
    pub fn new(train_env: E, eval_env: E, agent_config: A::Config, config: AgentStatsConfig) -> Self {
        Self {
            config,
            train_env: Rc::new(RefCell::new(train_env)),
            eval_env,
            agent_config,
            writer_factory: None,
            agents: vec![],
            fit_records: vec![],
        }
    }

    /// Sets the factory of the writers given to the fitted agents.
    pub fn writer_factory(mut self, f: impl FnMut(usize) -> Box<dyn Recorder> + 'static) -> Self {
        self.writer_factory = Some(Box::new(f));
        self
    }

    /// The name of the agents.
    pub fn agent_name(&self) -> &'static str {
        A::NAME
    }

    /// The config agents are built with.
    pub fn agent_config(&self) -> &A::Config {
        &self.agent_config
    }

    /// The configuration of the runner.
    pub fn config(&self) -> &AgentStatsConfig {
        &self.config
    }

    /// The fitted agents.
    pub fn agents(&mut self) -> &mut [A] {
        &mut self.agents
    }

    /// The records returned by [`Agent::fit`], one per agent, with `"fit_time"` added.
    pub fn fit_records(&self) -> &[Record] {
        &self.fit_records
    }

    /// Summary of the fit records, see [`RecordStorage::aggregate`].
    pub fn fit_summary(&self) -> Record {
        let mut storage = RecordStorage::new();
        for record in self.fit_records.iter() {
            storage.store(record.clone());
        }
        storage.aggregate()
    }

    fn build_agent(&self, config: A::Config) -> Result<A> {
        let core = AgentCore::new(A::NAME, &self.train_env, &self.config.core_config());
        A::build(core, config)
    }

    fn evaluator(&self) -> DefaultEvaluator<E> {
        let mut env = self.eval_env.clone();
        env.reseed(None);
        DefaultEvaluator::new(
            env,
            EvaluatorConfig {
                n_sim: self.config.n_eval_episodes,
                horizon: self.config.eval_horizon,
                gamma: self.config.gamma,
            },
        )
    }

    /// Fits `n_fit` agents, replacing previously fitted ones.
    pub fn fit(&mut self) -> Result<()> {
        if let Some(seed) = self.config.seed {
            seeding::set_global_seed(seed);
        }
        self.agents.clear();
        self.fit_records.clear();

        for i in 0..self.config.n_fit {
            let mut agent = self.build_agent(self.agent_config.clone())?;
            if let Some(factory) = self.writer_factory.as_mut() {
                agent.set_writer(Some(factory(i)));
            }

            info!("Fitting {} ({}/{})", A::NAME, i + 1, self.config.n_fit);
            let start = Local::now();
            let mut record = agent.fit()?;
            let elapsed = (Local::now() - start).num_milliseconds() as f32 / 1000.0;
            crate::check_fit_info(A::NAME, A::FIT_INFO, &record);
            record.insert("fit_time", RecordValue::Scalar(elapsed));

            self.agents.push(agent);
            self.fit_records.push(record);
        }

        Ok(())
    }

    /// Evaluates each fitted agent and returns their average discounted returns.
    pub fn eval(&mut self) -> Result<Vec<f32>> {
        if self.agents.is_empty() {
            return Err(BerryError::NotFitted.into());
        }
        let mut evaluator = self.evaluator();
        let mut values = Vec::with_capacity(self.agents.len());
        for agent in self.agents.iter_mut() {
            let record = evaluator.evaluate(agent)?;
            values.push(record.get_scalar("episode_return")?);
        }
        Ok(values)
    }

    fn output_dir(&self) -> PathBuf {
        let base = self.config.output_dir.as_deref().unwrap_or("results");
        Path::new(base).join(A::NAME)
    }

    /// Saves the configs and each fitted agent under `output_dir/<name>/fit_<i>`.
    ///
    /// Agents not implementing [`Agent::save`] are skipped with a warning.
    /// Returns the directories where agents were saved.
    pub fn save(&self) -> Result<Vec<PathBuf>> {
        if self.agents.is_empty() {
            return Err(BerryError::NotFitted.into());
        }
        let dir = self.output_dir();
        fs::create_dir_all(&dir)?;
        self.config.save(dir.join("stats_config.yaml"))?;
        fs::write(
            dir.join("agent_config.yaml"),
            serde_yaml::to_string(&self.agent_config)?,
        )?;

        let mut saved = vec![];
        for (i, agent) in self.agents.iter().enumerate() {
            let path = dir.join(format!("fit_{}", i));
            match agent.save(&path) {
                Ok(()) => {
                    info!("Saved {} in {:?}", A::NAME, &path);
                    saved.push(path);
                }
                Err(e) => match e.downcast_ref::<BerryError>() {
                    Some(BerryError::NotImplemented(_)) => {
                        warn!("{} cannot be saved: {}", A::NAME, e);
                    }
                    _ => return Err(e),
                },
            }
        }
        Ok(saved)
    }

    /// Replaces the fitted agents with those saved by [`AgentStats::save`].
    pub fn load(&mut self) -> Result<()> {
        let dir = self.output_dir();
        let mut agents = vec![];
        for i in 0..self.config.n_fit {
            let path = dir.join(format!("fit_{}", i));
            let core = AgentCore::new(A::NAME, &self.train_env, &self.config.core_config());
            agents.push(A::load(&path, core)?);
        }
        self.agents = agents;
        Ok(())
    }

    /// Searches the agent config maximizing the evaluation return of a single
    /// fitted agent, then uses the best config for subsequent fits.
    ///
    /// Sampled hyperparameters are set on the current agent config, fields that
    /// are not searched keep their values.
    pub fn optimize_hyperparams(&mut self, n_trials: usize) -> Result<A::Config> {
        let seed = self.config.seed.unwrap_or_else(seeding::spawn_seed);
        let mut study = Study::new(seed);
        let mut configs = vec![];
        let base = self.agent_config.clone();

        study.optimize(n_trials, |trial| {
            let config = A::sample_parameters(trial, &base)?;
            let mut agent = self.build_agent(config.clone())?;
            configs.push(config);
            agent.fit()?;
            let record = self.evaluator().evaluate(&mut agent)?;
            Ok(record.get_scalar("episode_return")?)
        })?;

        let best = study.best_trial()?;
        info!("Best trial: {:?}", best.to_record());
        self.agent_config = configs[best.number].clone();
        Ok(self.agent_config.clone())
    }
}

/// A runner whose fitted policies can be compared.
pub trait PolicyStats {
    /// The name of the agents.
    fn name(&self) -> &str;

    /// The evaluation returns of the fitted agents.
    fn eval_returns(&mut self) -> Result<Vec<f32>>;
}

impl<E, A> PolicyStats for AgentStats<E, A>
where
    E: Env,
    A: Agent<E>,
{
    fn name(&self) -> &str {
        A::NAME
    }

    fn eval_returns(&mut self) -> Result<Vec<f32>> {
        self.eval()
    }
}

/// Evaluation summary of a runner.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySummary {
    /// Name of the agents.
    pub name: String,
    /// Mean over agents of the evaluation returns.
    pub mean: f32,
    /// Standard deviation over agents of the evaluation returns.
    pub std: f32,
    /// Evaluation return of each agent.
    pub returns: Vec<f32>,
}

/// Evaluates the agents of several runners.
pub fn compare_policies(stats: &mut [&mut dyn PolicyStats]) -> Result<Vec<PolicySummary>> {
    let mut summaries = vec![];
    for s in stats.iter_mut() {
        let returns = s.eval_returns()?;
        let n = returns.len().max(1) as f32;
        let mean = returns.iter().sum::<f32>() / n;
        let std = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f32>() / n).sqrt();
        info!("{}: mean = {}, std = {}", s.name(), mean, std);
        summaries.push(PolicySummary {
            name: s.name().to_string(),
            mean,
            std,
            returns,
        });
    }
    Ok(summaries)
}
