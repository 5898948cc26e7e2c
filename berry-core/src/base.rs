//! Core functionalities.
mod agent;
mod env;
mod policy;
mod space;
mod step;
pub use agent::{check_fit_info, parse_config, Agent, AgentCore, AgentCoreConfig, EnvHandle};
pub use env::{Env, FiniteModel};
pub use policy::Policy;
pub use space::{Space, SpaceSample};
pub use step::Step;
