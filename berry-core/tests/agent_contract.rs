use anyhow::Result;
use berry_core::{
    error::BerryError,
    record::{BufferedRecorder, Record, RecordValue},
    seeding, Agent, AgentCore, AgentCoreConfig, AgentStats, AgentStatsConfig, Env, EnvHandle,
    Policy, Space, Step,
};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, rc::Rc};
use tempdir::TempDir;

/// Rewards action 1, episodes last `len` steps.
#[derive(Clone, Debug)]
struct CountEnv {
    len: usize,
    t: usize,
    seed: Option<u64>,
    n_steps_total: usize,
    rng: SmallRng,
    obs_space: Space,
    act_space: Space,
}

impl Env for CountEnv {
    type Config = usize;
    type Obs = usize;
    type Act = usize;

    fn build(config: &Self::Config, seed: u64) -> Result<Self> {
        Ok(Self {
            len: *config,
            t: 0,
            seed: Some(seed),
            n_steps_total: 0,
            rng: SmallRng::seed_from_u64(seed),
            obs_space: Space::discrete(*config + 1),
            act_space: Space::discrete(2),
        })
    }

    fn observation_space(&self) -> &Space {
        &self.obs_space
    }

    fn action_space(&self) -> &Space {
        &self.act_space
    }

    fn reseed(&mut self, seed: Option<u64>) {
        let seed = seed.unwrap_or_else(seeding::spawn_seed);
        self.seed = Some(seed);
        self.rng = SmallRng::seed_from_u64(seed);
    }

    fn reset(&mut self) -> Result<usize> {
        self.t = 0;
        Ok(0)
    }

    fn step(&mut self, act: &usize) -> Result<(Step<Self>, Record)> {
        self.t += 1;
        self.n_steps_total += 1;
        let _noise: f32 = self.rng.gen();
        let reward = if *act == 1 { 1.0 } else { 0.0 };
        let step = Step::new(self.t, *act, reward, self.t >= self.len, false);
        Ok((step, Record::empty()))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
struct ConstantConfig {
    action: usize,
    n_steps: usize,
}

/// Plays a fixed action; only the required operations are implemented.
struct ConstantAgent {
    core: AgentCore<CountEnv>,
    config: ConstantConfig,
}

impl Policy<CountEnv> for ConstantAgent {
    fn policy(&mut self, _obs: &usize) -> usize {
        self.config.action
    }
}

impl Agent<CountEnv> for ConstantAgent {
    type Config = ConstantConfig;
    const NAME: &'static str = "Constant";
    const FIT_INFO: &'static [&'static str] = &["n_steps"];

    fn build(core: AgentCore<CountEnv>, config: Self::Config) -> Result<Self> {
        Ok(Self { core, config })
    }

    fn core(&self) -> &AgentCore<CountEnv> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore<CountEnv> {
        &mut self.core
    }

    fn fit(&mut self) -> Result<Record> {
        let env = self.core.env();
        let mut env = env.borrow_mut();
        env.reset()?;
        for i in 0..self.config.n_steps {
            let (step, _) = env.step(&self.config.action)?;
            self.core.write(Record::from_slice(&[
                ("step", RecordValue::Scalar(i as f32)),
                ("reward", RecordValue::Scalar(step.reward)),
            ]));
            if step.is_done() {
                env.reset()?;
            }
        }
        Ok(Record::from_scalar("n_steps", self.config.n_steps as f32))
    }
}

fn env_handle() -> Result<EnvHandle<CountEnv>> {
    Ok(Rc::new(RefCell::new(CountEnv::build(&5, 0)?)))
}

fn is_not_implemented(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<BerryError>(),
        Some(BerryError::NotImplemented(_))
    )
}

#[test]
fn test_optional_operations_default_to_not_implemented() -> Result<()> {
    let env = env_handle()?;
    let core = AgentCore::new("Constant", &env, &AgentCoreConfig::default());
    let agent = ConstantAgent::build(core, ConstantConfig::default())?;
    let dir = TempDir::new("constant_agent")?;

    let err = agent.save(dir.path()).unwrap_err();
    assert!(is_not_implemented(&err));
    assert_eq!(err.to_string(), "agent.save() not implemented.");

    let core = AgentCore::new("Constant", &env, &AgentCoreConfig::default());
    let err = ConstantAgent::load(dir.path(), core).err().unwrap();
    assert_eq!(err.to_string(), "agent.load() not implemented.");

    let mut trial = berry_core::tuner::Trial::new(0, seeding::rng_from_seed(Some(0)));
    let err = ConstantAgent::sample_parameters(&mut trial, &ConstantConfig::default()).unwrap_err();
    assert_eq!(err.to_string(), "agent.sample_parameters() not implemented.");
    Ok(())
}

#[test]
fn test_copy_env_isolates_the_caller() -> Result<()> {
    let env = env_handle()?;
    let config = ConstantConfig {
        action: 1,
        n_steps: 3,
    };
    let core = AgentCore::new("Constant", &env, &AgentCoreConfig::default());
    let mut agent = ConstantAgent::build(core, config.clone())?;
    agent.fit()?;
    assert_eq!(env.borrow().n_steps_total, 0);
    assert_eq!(agent.core().env().borrow().n_steps_total, 3);

    let core = AgentCore::new("Constant", &env, &AgentCoreConfig::default().copy_env(false));
    let mut agent = ConstantAgent::build(core, config)?;
    agent.fit()?;
    assert_eq!(env.borrow().n_steps_total, 3);
    Ok(())
}

#[test]
fn test_reseed_env() -> Result<()> {
    let env = env_handle()?;
    let keep = AgentCoreConfig::default().reseed_env(false);
    let core = AgentCore::new("Constant", &env, &keep);
    assert_eq!(core.env().borrow().seed, Some(0));

    let core = AgentCore::new("Constant", &env, &AgentCoreConfig::default());
    assert_ne!(core.env().borrow().seed, Some(0));
    assert_eq!(env.borrow().seed, Some(0));
    Ok(())
}

#[test]
fn test_writer_receives_records() -> Result<()> {
    let env = env_handle()?;
    let core = AgentCore::new("Constant", &env, &AgentCoreConfig::default());
    let config = ConstantConfig {
        action: 1,
        n_steps: 4,
    };
    let mut agent = ConstantAgent::build(core, config)?;
    assert!(!agent.core().has_writer());

    let recorder = BufferedRecorder::new();
    agent.set_writer(Some(Box::new(recorder.clone())));
    let record = agent.fit()?;
    assert_eq!(record.get_scalar("n_steps")?, 4.0);
    assert_eq!(recorder.scalars("reward"), vec![1.0; 4]);

    agent.set_writer(None);
    agent.fit()?;
    assert_eq!(recorder.len(), 4);
    Ok(())
}

#[test]
fn test_unknown_parameters_are_rejected() -> Result<()> {
    let env = env_handle()?;
    let params: serde_yaml::Value = serde_yaml::from_str("action: 1\nlearning_rate: 0.1\n")?;
    let core = AgentCore::new("Constant", &env, &AgentCoreConfig::default());
    let err = ConstantAgent::build_from_params(core, &params).err().unwrap();
    match err.downcast_ref::<BerryError>() {
        Some(BerryError::UnknownParameters(keys)) => {
            assert_eq!(keys, &vec!["learning_rate".to_string()])
        }
        _ => panic!("unexpected error: {}", err),
    }

    let params: serde_yaml::Value = serde_yaml::from_str("action: 1\n")?;
    let core = AgentCore::new("Constant", &env, &AgentCoreConfig::default());
    let agent = ConstantAgent::build_from_params(core, &params)?;
    assert_eq!(agent.config.action, 1);
    assert_eq!(agent.config.n_steps, 0);
    assert_eq!(agent.name(), "Constant");
    Ok(())
}

#[test]
fn test_agent_stats_with_default_operations() -> Result<()> {
    let dir = TempDir::new("agent_stats")?;
    let config = AgentStatsConfig::default()
        .n_fit(3)
        .eval_horizon(5)
        .n_eval_episodes(2)
        .output_dir(dir.path().to_str().unwrap())
        .seed(0);
    let agent_config = ConstantConfig {
        action: 1,
        n_steps: 10,
    };
    let recorders = Rc::new(RefCell::new(vec![]));
    let recorders_ = recorders.clone();
    let mut stats = AgentStats::<CountEnv, ConstantAgent>::new(
        CountEnv::build(&5, 0)?,
        CountEnv::build(&5, 1)?,
        agent_config,
        config,
    )
    .writer_factory(move |_| {
        let r = BufferedRecorder::new();
        recorders_.borrow_mut().push(r.clone());
        Box::new(r)
    });

    assert!(stats.eval().is_err());
    stats.fit()?;
    assert_eq!(stats.fit_records().len(), 3);
    assert_eq!(recorders.borrow().len(), 3);
    for r in recorders.borrow().iter() {
        assert_eq!(r.len(), 10);
    }
    assert_eq!(stats.fit_summary().get_scalar("n_steps_mean")?, 10.0);
    assert_eq!(stats.eval()?, vec![5.0; 3]);

    // saving is not implemented by the agent: configs only
    assert!(stats.save()?.is_empty());
    assert!(dir.path().join("Constant").join("agent_config.yaml").exists());

    let err = stats.optimize_hyperparams(2).unwrap_err();
    assert!(is_not_implemented(&err));
    Ok(())
}
