//! Environment.
use super::{Space, Step};
use crate::{error::BerryError, record::Record};
use anyhow::Result;
use std::fmt::Debug;

/// Represents an environment, typically an MDP.
///
/// Environments are [`Clone`]: an agent works on its own deep copy unless it is
/// told otherwise, see [`AgentCore`](crate::AgentCore).
pub trait Env: Clone {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Clone + Debug;

    /// Action of the environment.
    type Act: Clone + Debug;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: u64) -> Result<Self>
    where
        Self: Sized;

    /// The set of observations.
    fn observation_space(&self) -> &Space;

    /// The set of actions.
    fn action_space(&self) -> &Space;

    /// Lower and upper bounds of a reward.
    fn reward_range(&self) -> (f32, f32) {
        (f32::NEG_INFINITY, f32::INFINITY)
    }

    /// Reseeds the internal random number generator.
    ///
    /// With `None`, the seed is drawn from the global seeder,
    /// see [`seeding`](crate::seeding).
    fn reseed(&mut self, seed: Option<u64>);

    /// Starts a new episode and returns its first observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Performs an environment step.
    ///
    /// The returned [`Record`] carries information specific to the environment.
    fn step(&mut self, act: &Self::Act) -> Result<(Step<Self>, Record)>;

    /// Returns `true` if the environment can be interacted with through [`Env::step`].
    fn is_online(&self) -> bool {
        true
    }

    /// Returns `true` if [`Env::sample`] is implemented.
    fn is_generative(&self) -> bool {
        false
    }

    /// Samples a transition from an arbitrary observation, without changing the
    /// current state of the environment.
    #[allow(unused_variables)]
    fn sample(&mut self, obs: &Self::Obs, act: &Self::Act) -> Result<(Step<Self>, Record)> {
        Err(BerryError::NotImplemented("env.sample()").into())
    }
}

/// A finite MDP whose dynamics are known, used by planning agents.
pub trait FiniteModel {
    /// The number of states.
    fn n_states(&self) -> usize;

    /// The number of actions.
    fn n_actions(&self) -> usize;

    /// The distribution of the next state, of length [`FiniteModel::n_states`].
    fn transition(&self, state: usize, action: usize) -> &[f32];

    /// The expected reward of taking `action` in `state`.
    fn reward(&self, state: usize, action: usize) -> f32;

    /// Returns `true` if an episode ends in `state`.
    fn is_terminal(&self, state: usize) -> bool;
}
