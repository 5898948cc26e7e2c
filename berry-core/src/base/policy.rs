//! Policy.
use super::Env;

/// A policy on an environment.
///
/// Policy is a mapping from an observation to an action.
/// The mapping can be either of deterministic or stochastic.
pub trait Policy<E: Env> {
    /// Returns the action to be taken given an observation.
    fn policy(&mut self, obs: &E::Obs) -> E::Act;
}
