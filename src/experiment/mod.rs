//! Running evolution: trials of generations, each generation scored by a pluggable
//! [GenerationEvaluator], and the bookkeeping collected along the way.

pub mod generation;
pub mod trial;

pub use generation::{Floats, Generation, PopulationStats};
pub use trial::{Summary, Trial, Winner};

use crate::{
    context::Context,
    error::{EvaluationError, ExperimentError},
    genome::Genome,
    network::{Activation, FromGenome, Phenotype},
    population::Population,
    random::Happens,
};
use std::time::Instant;
use tracing::{debug, info};

/// Scores every organism of a population, and records the outcome on a [Generation]
pub trait GenerationEvaluator<G: Genome, P: Phenotype> {
    fn generation_evaluate(
        &self,
        ctx: &Context,
        population: &mut Population<G, P>,
        generation: &mut Generation,
    ) -> Result<(), EvaluationError>;
}

/// Every trial run so far, and what they found
#[derive(Debug, Clone)]
pub struct Experiment<G: Genome> {
    pub id: usize,
    pub name: String,
    pub trials: Vec<Trial<G>>,
    pub max_fitness_score: f64,
}

impl<G: Genome> Experiment<G> {
    pub fn new(id: usize, name: impl Into<String>, max_fitness_score: f64) -> Self {
        Self {
            id,
            name: name.into(),
            trials: vec![],
            max_fitness_score,
        }
    }

    /// Run `num_runs` trials of up to `num_generations` generations, each trial starting over
    /// from `start`. A trial ends early on its first solved generation. Cancellation is checked
    /// between generations, and leaves the interrupted trial recorded as such.
    pub fn execute<P, E>(
        &mut self,
        ctx: &Context,
        start: &G,
        evaluator: &E,
        rng: &mut impl Happens,
        σ: Activation,
    ) -> Result<(), ExperimentError>
    where
        P: FromGenome<G> + Send,
        E: GenerationEvaluator<G, P>,
    {
        let options = ctx.options().ok_or(EvaluationError::ConfigurationMissing)?;

        for run in 0..options.num_runs {
            if ctx.is_cancelled() {
                info!(trial = run, "experiment cancelled before trial");
                break;
            }

            let started = Instant::now();
            let mut trial = Trial::new(run);
            let mut population = Population::<G, P>::spawn(start, options, rng, σ);

            for gen_id in 0..options.num_generations {
                if ctx.is_cancelled() {
                    info!(trial = run, generation = gen_id, "trial cancelled");
                    trial.interrupted = true;
                    break;
                }

                let gen_started = Instant::now();
                let mut generation = Generation::new(gen_id, run);
                evaluator.generation_evaluate(ctx, &mut population, &mut generation)?;
                generation.duration = gen_started.elapsed();

                if generation.solved {
                    if let Some(champion) = generation.champion(&population) {
                        trial.winner = Some(Winner {
                            genome: champion.genome.clone(),
                            fitness: champion.fitness,
                            generation: gen_id,
                            nodes: generation.winner_nodes,
                            genes: generation.winner_genes,
                            evals: generation.winner_evals,
                        });
                    }
                }

                debug!(
                    trial = run,
                    generation = gen_id,
                    species = population.species.len(),
                    best = generation.stats.map(|s| s.fitness.max),
                    solved = generation.solved,
                    "generation evaluated"
                );

                let solved = generation.solved;
                trial.generations.push(generation);
                if solved {
                    break;
                }

                if gen_id + 1 < options.num_generations {
                    population = population.epoch(options, rng, σ)?;
                }
            }

            trial.duration = started.elapsed();
            match &trial.winner {
                Some(winner) => info!(
                    trial = run,
                    generation = winner.generation,
                    nodes = winner.nodes,
                    genes = winner.genes,
                    evals = winner.evals,
                    "trial solved"
                ),
                None => info!(
                    trial = run,
                    generations = trial.generations.len(),
                    best = trial.best_fitness(),
                    "trial finished without a winner"
                ),
            }
            self.trials.push(trial);
        }

        Ok(())
    }

    pub fn summary(&self) -> Summary {
        Summary::new(&self.name, &self.trials, self.max_fitness_score)
    }
}
