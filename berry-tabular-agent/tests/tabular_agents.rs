use anyhow::Result;
use berry_core::{
    error::BerryError,
    evaluator::mc_policy_evaluation,
    record::BufferedRecorder,
    Agent, AgentCore, AgentStats, AgentStatsConfig, Env, Policy,
};
use berry_finite_env::{
    Chain, ChainConfig, FiniteMdp, FiniteMdpConfig, GridWorld, GridWorldConfig,
};
use berry_tabular_agent::{
    qlearning::{EpsilonGreedy, TabularExplorer},
    QLearningAgent, QLearningConfig, RandomAgent, RandomConfig, ReinforceAgent, ReinforceConfig,
    ValueIterationAgent, ValueIterationConfig,
};
use tempdir::TempDir;

fn chain() -> Result<FiniteMdp> {
    Chain::build(&ChainConfig::default().length(3).horizon(Some(20)), 0)
}

fn grid() -> GridWorldConfig {
    GridWorldConfig {
        success_probability: 1.0,
        ..GridWorldConfig::default()
    }
}

fn qlearning_config() -> QLearningConfig {
    QLearningConfig::default()
        .n_episodes(300)
        .horizon(20)
        .explorer(TabularExplorer::EpsilonGreedy(EpsilonGreedy {
            eps_start: 1.0,
            eps_final: 0.1,
            final_episode: 150,
        }))
}

#[test]
fn test_value_iteration_on_chain() -> Result<()> {
    let config = ValueIterationConfig {
        gamma: 0.9,
        epsilon: 1e-4,
        max_iterations: 1000,
    };
    let core = AgentCore::from_env("vi", chain()?, true);
    let mut agent = ValueIterationAgent::build(core, config)?;
    let record = agent.fit()?;

    assert!(record.get_scalar("precision")? < 1e-4);
    assert!(record.get_scalar("n_iterations")? < 1000.0);
    for s in 0..3 {
        assert_eq!(agent.policy(&s), 0);
    }
    // V(2) = 1 / (1 - gamma)
    assert!((agent.values()[2] - 10.0).abs() < 1e-2);
    Ok(())
}

#[test]
fn test_value_iteration_reaches_goal() -> Result<()> {
    let mut env = GridWorld::build(&grid(), 0)?;
    let core = AgentCore::from_env("vi", env.clone(), true);
    let mut agent = ValueIterationAgent::build(core, ValueIterationConfig::default())?;
    agent.fit()?;

    let goal = GridWorld::new(&grid())?.state_of((4, 4));
    let mut obs = env.reset()?;
    let mut n_steps = 0;
    loop {
        let (step, _) = env.step(&agent.policy(&obs))?;
        n_steps += 1;
        if step.is_terminated {
            assert_eq!(Some(step.obs), goal);
            assert_eq!(step.reward, 1.0);
            break;
        }
        assert!(!step.is_truncated);
        obs = step.obs;
    }
    // shortest path around the walls
    assert_eq!(n_steps, 8);
    Ok(())
}

#[test]
fn test_value_iteration_rejects_gamma_one() -> Result<()> {
    let core = AgentCore::from_env("vi", chain()?, true);
    let config = ValueIterationConfig {
        gamma: 1.0,
        ..ValueIterationConfig::default()
    };
    assert!(ValueIterationAgent::build(core, config).is_err());
    Ok(())
}

#[test]
fn test_qlearning_learns_chain() -> Result<()> {
    let core = AgentCore::from_env("ql", chain()?, true);
    let mut agent = QLearningAgent::build(core, qlearning_config())?;
    let writer = BufferedRecorder::new();
    agent.set_writer(Some(Box::new(writer.clone())));
    let record = agent.fit()?;

    assert_eq!(record.get_scalar("n_episodes")?, 300.0);
    assert_eq!(record.get_array1("episode_rewards")?.len(), 300);
    assert_eq!(writer.len(), 300);
    assert_eq!(writer.scalars("episode")[299], 299.0);

    let q = agent.q_table();
    assert!(q.get(0, 0) > q.get(0, 1));
    assert!(q.get(1, 0) > q.get(1, 1));

    // reaching the last state takes two steps
    let mut env = chain()?;
    let returns = mc_policy_evaluation(&mut env, &mut agent, 20, 1.0, 5)?;
    assert!(returns.iter().all(|r| *r == 18.0));
    Ok(())
}

#[test]
fn test_qlearning_reset() -> Result<()> {
    let core = AgentCore::from_env("ql", chain()?, true);
    let mut agent = QLearningAgent::build(core, qlearning_config().n_episodes(20))?;
    agent.fit()?;
    agent.reset();
    let q = agent.q_table();
    assert!((0..3).all(|s| q.row(s).iter().all(|v| *v == 0.0)));
    Ok(())
}

#[test]
fn test_reinforce_improves() -> Result<()> {
    let config = ReinforceConfig::default()
        .n_episodes(400)
        .horizon(20)
        .learning_rate(0.01)
        .normalize_returns(false);
    let core = AgentCore::from_env("reinforce", chain()?, true);
    let mut agent = ReinforceAgent::build(core, config)?;
    let record = agent.fit()?;

    let rewards = record.get_array1("episode_rewards")?;
    let mean = |v: &[f32]| v.iter().sum::<f32>() / v.len() as f32;
    assert!(mean(&rewards[300..]) > mean(&rewards[..100]));
    assert!(agent.action_probs(0)[0] > 0.5);
    Ok(())
}

#[test]
fn test_random_agent() -> Result<()> {
    let core = AgentCore::from_env("random", chain()?, true);
    let mut agent = RandomAgent::build(core, RandomConfig::default())?;
    assert!(agent.fit()?.is_empty());
    assert!((0..100).all(|_| agent.policy(&0) < 2));

    let dir = TempDir::new("random")?;
    let err = agent.save(dir.path()).unwrap_err();
    assert_eq!(err.to_string(), "agent.save() not implemented.");
    Ok(())
}

#[test]
fn test_save_load() -> Result<()> {
    let dir = TempDir::new("qlearning")?;
    let core = AgentCore::from_env("ql", chain()?, true);
    let mut agent = QLearningAgent::build(core, qlearning_config().n_episodes(50))?;
    agent.fit()?;
    agent.save(dir.path())?;
    assert!(dir.path().join("config.yaml").is_file());

    let core = AgentCore::from_env("ql", chain()?, true);
    let loaded = QLearningAgent::load(dir.path(), core)?;
    assert_eq!(loaded.q_table(), agent.q_table());
    assert_eq!(loaded.config(), agent.config());

    let core = AgentCore::from_env("vi", chain()?, true);
    let mut vi = ValueIterationAgent::build(core, ValueIterationConfig::default())?;
    vi.fit()?;
    let path = dir.path().join("vi");
    vi.save(&path)?;
    let core = AgentCore::from_env("vi", chain()?, true);
    let loaded = ValueIterationAgent::load(&path, core)?;
    assert_eq!(loaded.q_table(), vi.q_table());
    Ok(())
}

#[test]
fn test_value_iteration_load_keeps_terminal_values() -> Result<()> {
    // state 1 is terminal and its own actions are rewarded
    let config = FiniteMdpConfig {
        rewards: vec![vec![0.0, 1.0], vec![5.0, 5.0]],
        transitions: vec![
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![vec![0.0, 1.0], vec![0.0, 1.0]],
        ],
        initial_state_distribution: None,
        terminal_states: vec![1],
        horizon: Some(10),
    };
    let dir = TempDir::new("value_iteration")?;
    let core = AgentCore::from_env("vi", FiniteMdp::new(&config, 0)?, true);
    let mut agent = ValueIterationAgent::build(core, ValueIterationConfig::default())?;
    agent.fit()?;
    assert_eq!(agent.values()[1], 0.0);
    agent.save(dir.path())?;

    let core = AgentCore::from_env("vi", FiniteMdp::new(&config, 0)?, true);
    let loaded = ValueIterationAgent::load(dir.path(), core)?;
    assert_eq!(loaded.values(), agent.values());
    Ok(())
}

#[test]
fn test_load_on_other_env_fails() -> Result<()> {
    let dir = TempDir::new("qlearning")?;
    let core = AgentCore::from_env("ql", chain()?, true);
    let agent = QLearningAgent::build(core, qlearning_config())?;
    agent.save(dir.path())?;

    let env = Chain::build(&ChainConfig::default().length(5), 0)?;
    let core = AgentCore::from_env("ql", env, true);
    assert!(QLearningAgent::load(dir.path(), core).is_err());
    Ok(())
}

#[test]
fn test_unknown_parameters() -> Result<()> {
    let params: serde_yaml::Value = serde_yaml::from_str("{learning_rate: 0.5, n_episode: 10}")?;
    let core = AgentCore::from_env("ql", chain()?, true);
    let err = QLearningAgent::build_from_params(core, &params).err().unwrap();
    match err.downcast_ref::<BerryError>() {
        Some(BerryError::UnknownParameters(keys)) => assert_eq!(keys, &["n_episode"]),
        _ => panic!("unexpected error: {}", err),
    }

    let params: serde_yaml::Value = serde_yaml::from_str("{learning_rate: 0.5, n_episodes: 10}")?;
    let core = AgentCore::from_env("ql", chain()?, true);
    let agent = QLearningAgent::build_from_params(core, &params)?;
    assert_eq!(agent.config().learning_rate, 0.5);
    assert_eq!(agent.config().n_episodes, 10);
    Ok(())
}

#[test]
fn test_agent_stats_with_qlearning() -> Result<()> {
    let dir = TempDir::new("stats")?;
    let config = AgentStatsConfig::default()
        .n_fit(2)
        .eval_horizon(20)
        .n_eval_episodes(3)
        .seed(7)
        .output_dir(dir.path().to_string_lossy());
    let mut stats: AgentStats<FiniteMdp, QLearningAgent<FiniteMdp>> =
        AgentStats::new(chain()?, chain()?, qlearning_config(), config);

    let best = stats.optimize_hyperparams(3)?;
    assert_eq!(stats.agent_config(), &best);

    stats.fit()?;
    assert_eq!(stats.fit_records().len(), 2);
    assert!(stats.fit_summary().contains_key("fit_time_mean"));
    assert_eq!(stats.eval()?.len(), 2);

    let saved = stats.save()?;
    assert_eq!(saved.len(), 2);
    assert!(saved[1].ends_with("QLearning/fit_1"));

    let q0 = stats.agents()[0].q_table().clone();
    stats.load()?;
    assert_eq!(stats.agents()[0].q_table(), &q0);
    Ok(())
}

#[test]
fn test_tuning_keeps_untuned_fields() -> Result<()> {
    let dir = TempDir::new("stats")?;
    let explorer = TabularExplorer::EpsilonGreedy(EpsilonGreedy {
        eps_start: 0.5,
        eps_final: 0.1,
        final_episode: 3,
    });
    let agent_config = QLearningConfig::default()
        .n_episodes(7)
        .horizon(5)
        .explorer(explorer);
    let config = AgentStatsConfig::default()
        .n_fit(1)
        .eval_horizon(5)
        .n_eval_episodes(2)
        .output_dir(dir.path().to_string_lossy());
    let mut stats: AgentStats<FiniteMdp, QLearningAgent<FiniteMdp>> =
        AgentStats::new(chain()?, chain()?, agent_config, config);

    let best = stats.optimize_hyperparams(2)?;
    assert_eq!(best.n_episodes, 7);
    assert_eq!(best.horizon, 5);
    match best.explorer {
        TabularExplorer::EpsilonGreedy(e) => {
            assert_eq!(e.eps_start, 0.5);
            assert_eq!(e.final_episode, 3);
            assert!((0.0..=0.2).contains(&e.eps_final));
        }
        _ => panic!("explorer changed: {:?}", best.explorer),
    }
    Ok(())
}
