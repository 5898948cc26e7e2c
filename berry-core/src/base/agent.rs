//! Agent.
use super::{Env, Policy};
use crate::{
    error::BerryError,
    record::{Record, Recorder},
    seeding,
    tuner::Trial,
};
use anyhow::Result;
use log::{debug, warn};
use rand::rngs::SmallRng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{cell::RefCell, fmt::Debug, path::Path, rc::Rc};

/// A handle of an environment that can be shared between agents.
pub type EnvHandle<E> = Rc<RefCell<E>>;

/// How an agent takes the environment given at construction.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct AgentCoreConfig {
    /// Works on a deep copy of the environment. Otherwise the environment is shared
    /// with the caller.
    pub copy_env: bool,

    /// Reseeds the environment with a seed drawn from the global seeder.
    pub reseed_env: bool,
}

impl Default for AgentCoreConfig {
    fn default() -> Self {
        Self {
            copy_env: true,
            reseed_env: true,
        }
    }
}

impl AgentCoreConfig {
    /// Sets `copy_env`.
    pub fn copy_env(mut self, v: bool) -> Self {
        self.copy_env = v;
        self
    }

    /// Sets `reseed_env`.
    pub fn reseed_env(mut self, v: bool) -> Self {
        self.reseed_env = v;
        self
    }
}

/// State common to all agents: the name, the environment, the writer and a
/// random number generator.
pub struct AgentCore<E: Env> {
    name: String,
    env: EnvHandle<E>,
    writer: Option<Box<dyn Recorder>>,
    rng: SmallRng,
}

impl<E: Env> AgentCore<E> {
    /// Constructs the core of an agent.
    ///
    /// With `copy_env`, the agent gets a deep copy of `env`. Otherwise it shares
    /// `env` with the caller. With `reseed_env`, the environment of the agent is
    /// reseeded. The writer is initially unset.
    pub fn new(name: impl Into<String>, env: &EnvHandle<E>, config: &AgentCoreConfig) -> Self {
        let env = if config.copy_env {
            Rc::new(RefCell::new(env.borrow().clone()))
        } else {
            env.clone()
        };
        if config.reseed_env {
            env.borrow_mut().reseed(None);
        }
        let name = name.into();
        debug!(
            "Constructed agent core {:?} (copy_env = {}, reseed_env = {})",
            name, config.copy_env, config.reseed_env
        );

        Self {
            name,
            env,
            writer: None,
            rng: seeding::rng_from_seed(None),
        }
    }

    /// Constructs the core of an agent owning `env`.
    pub fn from_env(name: impl Into<String>, env: E, reseed_env: bool) -> Self {
        let env = Rc::new(RefCell::new(env));
        Self::new(name, &env, &AgentCoreConfig::default().copy_env(false).reseed_env(reseed_env))
    }

    /// Agent identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A handle of the environment the agent is trained on.
    ///
    /// The handle is detached from `self`, so the environment can be borrowed
    /// while the agent is being updated.
    pub fn env(&self) -> EnvHandle<E> {
        self.env.clone()
    }

    /// Sets the writer.
    pub fn set_writer(&mut self, writer: Option<Box<dyn Recorder>>) {
        self.writer = writer;
    }

    /// Returns `true` if a writer is set.
    pub fn has_writer(&self) -> bool {
        self.writer.is_some()
    }

    /// Sends a record to the writer, if any.
    pub fn write(&mut self, record: Record) {
        if let Some(writer) = self.writer.as_mut() {
            writer.write(record);
        }
    }

    /// The random number generator of the agent.
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}

/// Represents a trainable policy on an environment.
///
/// Implementors provide [`Agent::build`], [`Agent::fit`] and [`Policy::policy`];
/// the other operations are optional.
pub trait Agent<E: Env>: Policy<E> {
    /// Hyperparameters given at construction.
    ///
    /// Configs are expected to be `#[serde(default, deny_unknown_fields)]`, so that
    /// [`parse_config`] can build them from partial parameter maps.
    type Config: Clone + Debug + Default + Serialize + DeserializeOwned;

    /// Agent identifier.
    const NAME: &'static str;

    /// The keys of the record returned by [`Agent::fit`].
    const FIT_INFO: &'static [&'static str];

    /// Builds the agent.
    fn build(core: AgentCore<E>, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Builds the agent from a parameter map. Unknown parameters are an error.
    fn build_from_params(core: AgentCore<E>, params: &serde_yaml::Value) -> Result<Self>
    where
        Self: Sized,
    {
        let config = parse_config::<Self::Config>(params)?;
        Self::build(core, config)
    }

    /// Returns the core of the agent.
    fn core(&self) -> &AgentCore<E>;

    /// Returns the core of the agent.
    fn core_mut(&mut self) -> &mut AgentCore<E>;

    /// Agent identifier.
    fn name<'a>(&'a self) -> &'a str
    where
        E: 'a,
    {
        self.core().name()
    }

    /// Trains the agent on its environment.
    ///
    /// The returned record has the keys listed in [`Agent::FIT_INFO`].
    fn fit(&mut self) -> Result<Record>;

    /// Puts the agent back into its default setup.
    fn reset(&mut self) {}

    /// Saves the agent in the directory `path`.
    #[allow(unused_variables)]
    fn save(&self, path: &Path) -> Result<()> {
        Err(BerryError::NotImplemented("agent.save()").into())
    }

    /// Loads an agent saved in the directory `path`.
    #[allow(unused_variables)]
    fn load(path: &Path, core: AgentCore<E>) -> Result<Self>
    where
        Self: Sized,
    {
        Err(BerryError::NotImplemented("agent.load()").into())
    }

    /// Sets the writer.
    fn set_writer(&mut self, writer: Option<Box<dyn Recorder>>) {
        self.core_mut().set_writer(writer);
    }

    /// Samples hyperparameters for hyperparameter optimization.
    ///
    /// The sampled hyperparameters are set on a copy of `base`, so fields the
    /// search does not cover keep the values of `base`.
    #[allow(unused_variables)]
    fn sample_parameters(trial: &mut Trial, base: &Self::Config) -> Result<Self::Config>
    where
        Self: Sized,
    {
        Err(BerryError::NotImplemented("agent.sample_parameters()").into())
    }
}

/// Builds a config from a parameter map.
///
/// Keys that are not fields of `C` are reported together as
/// [`BerryError::UnknownParameters`]. `Null` stands for no parameter.
pub fn parse_config<C>(params: &serde_yaml::Value) -> Result<C>
where
    C: Default + Serialize + DeserializeOwned,
{
    let given = match params {
        serde_yaml::Value::Null => return Ok(C::default()),
        serde_yaml::Value::Mapping(m) => m,
        _ => {
            return Err(
                BerryError::InvalidParameters("parameters must be a mapping".to_string()).into(),
            )
        }
    };
    let known = match serde_yaml::to_value(C::default())? {
        serde_yaml::Value::Mapping(m) => m,
        _ => serde_yaml::Mapping::new(),
    };
    let mut unknown: Vec<String> = given
        .iter()
        .map(|(k, _)| k)
        .filter(|k| !known.contains_key(*k))
        .map(|k| match k {
            serde_yaml::Value::String(s) => s.clone(),
            k => format!("{:?}", k),
        })
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        return Err(BerryError::UnknownParameters(unknown).into());
    }

    serde_yaml::from_value(params.clone())
        .map_err(|e| BerryError::InvalidParameters(e.to_string()).into())
}

/// Warns about keys of [`Agent::FIT_INFO`] missing in a fit record.
///
/// Returns `true` if every key is present.
pub fn check_fit_info(name: &str, fit_info: &[&str], record: &Record) -> bool {
    let mut ok = true;
    for key in fit_info.iter() {
        if !record.contains_key(key) {
            warn!("{}: key {:?} is missing in the result of fit()", name, key);
            ok = false;
        }
    }
    ok
}
