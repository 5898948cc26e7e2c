use anyhow::Result;
use berry::{run, AgentKind, EnvSpec, ExperimentConfig, RunOptions};
use berry_core::error::BerryError;
use tempdir::TempDir;

fn config(output_dir: &str, agents: &str) -> Result<ExperimentConfig> {
    let yaml = format!(
        r#"
env:
  chain:
    length: 3
    horizon: 20
agents:
{}
stats:
  n_fit: 2
  eval_horizon: 20
  n_eval_episodes: 3
  seed: 1
  output_dir: {}
"#,
        agents, output_dir
    );
    Ok(serde_yaml::from_str(&yaml)?)
}

#[test]
fn test_parse_experiment() -> Result<()> {
    let config = config(
        "results",
        "  - agent: QLearning\n    params:\n      n_episodes: 10\n  - agent: Random",
    )?;
    assert!(matches!(config.env, EnvSpec::Chain(_)));
    assert_eq!(config.agents.len(), 2);
    assert_eq!(config.agents[0].agent, AgentKind::QLearning);
    assert!(config.agents[1].params.is_null());
    assert_eq!(config.stats.n_fit, 2);
    Ok(())
}

#[test]
fn test_save_load_experiment() -> Result<()> {
    let dir = TempDir::new("experiment")?;
    let config = config("results", "  - agent: ValueIteration")?;
    let path = dir.path().join("experiment.yaml");
    config.save(&path)?;
    assert_eq!(ExperimentConfig::load(&path)?, config);
    Ok(())
}

#[test]
fn test_run_experiment() -> Result<()> {
    let dir = TempDir::new("experiment")?;
    let output_dir = dir.path().join("results");
    let agents = "  - agent: ValueIteration\n  - agent: QLearning\n    params:\n      n_episodes: 50\n      horizon: 20\n  - agent: Random";
    let config = config(&output_dir.to_string_lossy(), agents)?;

    let opts = RunOptions {
        n_trials: None,
        logdir: Some(dir.path().join("logs")),
    };
    let summaries = run(&config, &opts)?;

    let names: Vec<_> = summaries.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["ValueIteration", "QLearning", "Random"]);
    assert!(summaries.iter().all(|s| s.returns.len() == 2));
    // the optimal policy collects reward from the third step on
    assert_eq!(summaries[0].mean, 18.0);
    assert!(summaries[0].mean >= summaries[2].mean);

    assert!(output_dir.join("ValueIteration/fit_1/q_table.bin").is_file());
    assert!(output_dir.join("Random/agent_config.yaml").is_file());
    assert!(!output_dir.join("Random/fit_0").exists());
    assert!(dir.path().join("logs/QLearning/fit_0").is_dir());
    Ok(())
}

#[test]
fn test_run_with_tuning() -> Result<()> {
    let dir = TempDir::new("experiment")?;
    let output_dir = dir.path().join("results");
    let agents = "  - agent: Reinforce\n    params:\n      n_episodes: 20\n  - agent: Random";
    let config = config(&output_dir.to_string_lossy(), agents)?;

    let opts = RunOptions {
        n_trials: Some(2),
        logdir: None,
    };
    let summaries = run(&config, &opts)?;
    assert_eq!(summaries.len(), 2);
    Ok(())
}

#[test]
fn test_unknown_agent_parameter() -> Result<()> {
    let dir = TempDir::new("experiment")?;
    let agents = "  - agent: QLearning\n    params:\n      learning_rte: 0.5";
    let config = config(&dir.path().to_string_lossy(), agents)?;

    let err = run(&config, &RunOptions::default()).err().unwrap();
    match err.downcast_ref::<BerryError>() {
        Some(BerryError::UnknownParameters(keys)) => assert_eq!(keys, &["learning_rte"]),
        _ => panic!("unexpected error: {}", err),
    }
    Ok(())
}

#[test]
fn test_unknown_agent() {
    assert!(config("results", "  - agent: Sarsa").is_err());
}
