use anyhow::Result;
use berry::{run, ExperimentConfig, RunOptions};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit, evaluate and save the agents of an experiment
    Fit {
        /// Experiment config in YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Number of hyperparameter optimization trials before fitting
        #[arg(short, long)]
        trials: Option<usize>,

        /// Write Tensorboard logs in this directory
        #[arg(short, long)]
        logdir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Fit {
            config,
            trials,
            logdir,
        } => {
            let config = ExperimentConfig::load(&config)?;
            let opts = RunOptions {
                n_trials: trials,
                logdir,
            };
            let summaries = run(&config, &opts)?;

            println!("{:<16} {:>10} {:>10}", "agent", "mean", "std");
            for s in summaries.iter() {
                println!("{:<16} {:>10.3} {:>10.3}", s.name, s.mean, s.std);
            }
        }
    }

    Ok(())
}
