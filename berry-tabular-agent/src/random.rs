//! Uniformly random agent.
use anyhow::Result;
use berry_core::{
    error::BerryError, record::Record, Agent, AgentCore, Env, Policy, Space,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Configuration of [`RandomAgent`]. The agent has no parameter.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct RandomConfig {}

/// Picks actions uniformly at random. Useful as a baseline.
pub struct RandomAgent<E: Env<Act = usize>> {
    core: AgentCore<E>,
    n_actions: usize,
}

impl<E: Env<Act = usize>> Policy<E> for RandomAgent<E> {
    fn policy(&mut self, _obs: &E::Obs) -> usize {
        self.core.rng().gen_range(0..self.n_actions)
    }
}

impl<E: Env<Act = usize>> Agent<E> for RandomAgent<E> {
    type Config = RandomConfig;
    const NAME: &'static str = "Random";
    const FIT_INFO: &'static [&'static str] = &[];

    fn build(core: AgentCore<E>, _config: Self::Config) -> Result<Self> {
        let n_actions = match core.env().borrow().action_space() {
            Space::Discrete { n } if *n > 0 => *n,
            space => {
                return Err(BerryError::InvalidSpace(format!(
                    "non-empty discrete action space required, got {:?}",
                    space
                ))
                .into())
            }
        };
        Ok(Self { core, n_actions })
    }

    fn core(&self) -> &AgentCore<E> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore<E> {
        &mut self.core
    }

    fn fit(&mut self) -> Result<Record> {
        Ok(Record::empty())
    }
}
