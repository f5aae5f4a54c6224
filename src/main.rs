#![allow(mixed_script_confusables)]
#![allow(confusable_idents)]

use clap::Parser;
use neatxor::{
    constants::NEATXOR_XOR_MAX_FITNESS,
    logging::init_logging,
    random::run_rng,
    runner::{termination, wait_for, WaitError},
    Activation, Context, Experiment, Genome, Options, Recurrent, Synchronous, WConnection,
    XorGenerationEvaluator,
};
use std::{
    error::Error,
    fs,
    future::pending,
    path::{Path, PathBuf},
    process,
};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

type XorGenome = Recurrent<WConnection>;

#[derive(Parser)]
#[command(name = "neatxor")]
#[command(version)]
#[command(about = "Evolve networks solving XOR with NEAT")]
struct Cli {
    /// Run options (JSON). Defaults are used for anything missing
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Start genome (JSON). Defaults to bias and both inputs wired to one output
    #[arg(short, long)]
    genome: Option<PathBuf>,

    /// Directory to write the summary and winner genomes to
    #[arg(long)]
    output: Option<PathBuf>,

    /// Override the number of trials
    #[arg(short, long)]
    trials: Option<usize>,

    /// Override the number of generations per trial
    #[arg(long)]
    generations: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

fn load_options(cli: &Cli) -> Result<Options, Box<dyn Error>> {
    let mut options = match &cli.options {
        Some(path) => {
            info!(path = %path.display(), "loading options");
            Options::from_file(path)?
        }
        None => Options::default(),
    };
    if let Some(trials) = cli.trials {
        options.num_runs = trials;
    }
    if let Some(generations) = cli.generations {
        options.num_generations = generations;
    }
    options.validate()?;
    Ok(options)
}

fn load_genome(cli: &Cli) -> Result<XorGenome, Box<dyn Error>> {
    match &cli.genome {
        Some(path) => {
            info!(path = %path.display(), "loading start genome");
            XorGenome::from_file(path)
        }
        None => Ok(XorGenome::fully_connected(2, 1).0),
    }
}

fn write_output(path: &Path, experiment: &Experiment<XorGenome>) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path)?;
    experiment.summary().to_file(path.join("summary.json"))?;
    for trial in experiment.trials.iter() {
        if let Some(winner) = &trial.winner {
            winner
                .genome
                .to_file(path.join(format!("trial_{}_winner.json", trial.id)))?;
        }
    }
    info!(path = %path.display(), "results written");
    Ok(())
}

/// Resolves on a termination signal, never if signals cannot be listened for
async fn signalled() {
    if let Err(err) = termination().await {
        warn!(%err, "cannot listen for termination signals");
        pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let cli = Cli::parse();

    let options = load_options(&cli)?;
    let start = load_genome(&cli)?;
    println!("{}", start.to_string()?);

    let mut rng = run_rng(&options, cli.seed);
    let (ctx, cancel) = Context::with_cancel(Some(options));
    let (tx, rx) = oneshot::channel();

    tokio::task::spawn_blocking(move || {
        let mut experiment = Experiment::new(0, "XOR", NEATXOR_XOR_MAX_FITNESS);
        let result = experiment
            .execute::<Synchronous, _>(
                &ctx,
                &start,
                &XorGenerationEvaluator,
                &mut rng,
                Activation::SteepSigmoid,
            )
            .map(|()| experiment);
        // nobody is left to tell when the receiver is gone
        let _ = tx.send(result);
    });

    println!("\nPress Ctrl+C to stop, twice to stop without waiting");
    let outcome = match wait_for(rx, signalled(), signalled(), cancel).await {
        Ok(outcome) => outcome,
        // the blocking task would hold the runtime open until its generation ends
        Err(WaitError::Abandoned) => process::exit(130),
        Err(err) => return Err(err.into()),
    };
    let interrupted = outcome.is_interrupted();
    let experiment = match outcome.into_inner() {
        Ok(experiment) => experiment,
        Err(err) => {
            error!(%err, "experiment execution failed");
            return Err(err.into());
        }
    };
    if interrupted {
        info!(trials = experiment.trials.len(), "experiment interrupted");
    }

    println!("{}", experiment.summary());
    if let Some(path) = &cli.output {
        write_output(path, &experiment)?;
    }

    Ok(())
}
