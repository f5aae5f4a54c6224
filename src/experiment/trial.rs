use super::generation::Generation;
use crate::genome::Genome;
use core::{error::Error, fmt, time::Duration};
use serde::Serialize;
use std::{fs, path::Path};

/// Snapshot of the champion that solved a trial. Owns a copy of its genome, so it outlives the
/// population it was found in
#[derive(Debug, Clone, Serialize)]
pub struct Winner<G: Genome> {
    pub genome: G,
    pub fitness: f64,
    pub generation: usize,
    pub nodes: usize,
    pub genes: usize,
    pub evals: usize,
}

/// One independent evolution run
#[derive(Debug, Clone, Serialize)]
pub struct Trial<G: Genome> {
    pub id: usize,
    pub generations: Vec<Generation>,
    pub winner: Option<Winner<G>>,
    pub interrupted: bool,
    pub duration: Duration,
}

impl<G: Genome> Trial<G> {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            generations: vec![],
            winner: None,
            interrupted: false,
            duration: Duration::ZERO,
        }
    }

    #[inline]
    pub fn solved(&self) -> bool {
        self.winner.is_some()
    }

    /// Highest fitness seen in any generation of this trial
    pub fn best_fitness(&self) -> Option<f64> {
        self.generations
            .iter()
            .filter_map(|g| g.stats.map(|s| s.fitness.max))
            .reduce(f64::max)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (n, sum) = values.fold((0usize, 0.), |(n, s), v| (n + 1, s + v));
    (n > 0).then(|| sum / n as f64)
}

/// Aggregate outcome of an experiment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub name: String,
    pub trials: usize,
    pub solved: usize,
    pub interrupted: usize,
    pub success_rate: f64,
    pub mean_winner_nodes: Option<f64>,
    pub mean_winner_genes: Option<f64>,
    pub mean_winner_evals: Option<f64>,
    pub mean_generations_to_solve: Option<f64>,
    pub mean_generation_secs: Option<f64>,
    pub best_fitness: Option<f64>,
    pub max_fitness_score: f64,
}

impl Summary {
    pub fn new<G: Genome>(name: &str, trials: &[Trial<G>], max_fitness_score: f64) -> Self {
        let winners = || trials.iter().filter_map(|t| t.winner.as_ref());
        let solved = winners().count();

        Self {
            name: name.to_string(),
            trials: trials.len(),
            solved,
            interrupted: trials.iter().filter(|t| t.interrupted).count(),
            success_rate: if trials.is_empty() {
                0.
            } else {
                solved as f64 / trials.len() as f64
            },
            mean_winner_nodes: mean(winners().map(|w| w.nodes as f64)),
            mean_winner_genes: mean(winners().map(|w| w.genes as f64)),
            mean_winner_evals: mean(winners().map(|w| w.evals as f64)),
            mean_generations_to_solve: mean(winners().map(|w| (w.generation + 1) as f64)),
            mean_generation_secs: mean(
                trials
                    .iter()
                    .flat_map(|t| t.generations.iter())
                    .map(|g| g.duration.as_secs_f64()),
            ),
            best_fitness: trials
                .iter()
                .filter_map(|t| t.best_fitness())
                .reduce(f64::max),
            max_fitness_score,
        }
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

struct Maybe(Option<f64>);

impl fmt::Display for Maybe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:.3}"),
            None => write!(f, "-"),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "experiment {}", self.name)?;
        writeln!(
            f,
            "  solved {}/{} trials ({:.1}%), {} interrupted",
            self.solved,
            self.trials,
            self.success_rate * 100.,
            self.interrupted
        )?;
        writeln!(
            f,
            "  best fitness {} of {}",
            Maybe(self.best_fitness),
            self.max_fitness_score
        )?;
        writeln!(
            f,
            "  winners: nodes {} genes {} evals {} generations {}",
            Maybe(self.mean_winner_nodes),
            Maybe(self.mean_winner_genes),
            Maybe(self.mean_winner_evals),
            Maybe(self.mean_generations_to_solve)
        )?;
        write!(
            f,
            "  mean generation time {}s",
            Maybe(self.mean_generation_secs)
        )
    }
}
