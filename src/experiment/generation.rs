use crate::{
    genome::Genome,
    network::Phenotype,
    population::{Organism, Population},
};
use core::{cmp::Ordering, time::Duration};
use serde::Serialize;

/// Summary of one distribution of per organism values
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Floats {
    pub mean: f64,
    pub median: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
}

impl Floats {
    pub fn new(values: impl Iterator<Item = f64>) -> Self {
        let mut values = values.collect::<Vec<_>>();
        if values.is_empty() {
            return Self::default();
        }
        values.sort_by(|l, r| l.partial_cmp(r).unwrap_or(Ordering::Equal));

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let mid = values.len() / 2;
        let median = if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.
        } else {
            values[mid]
        };

        Self {
            mean,
            median,
            variance,
            min: values[0],
            max: values[values.len() - 1],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PopulationStats {
    pub fitness: Floats,
    pub error: Floats,
    pub complexity: Floats,
    pub species: usize,
}

/// The result record of evaluating one generation. The champion is held as an index into the
/// population it was evaluated against, and is only meaningful alongside that population.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Generation {
    pub id: usize,
    pub trial_id: usize,
    pub champion: Option<usize>,
    pub solved: bool,
    pub winner_nodes: usize,
    pub winner_genes: usize,
    pub winner_evals: usize,
    pub stats: Option<PopulationStats>,
    pub duration: Duration,
}

impl Generation {
    pub fn new(id: usize, trial_id: usize) -> Self {
        Self {
            id,
            trial_id,
            ..Self::default()
        }
    }

    pub fn champion<'a, G: Genome, P: Phenotype>(
        &self,
        population: &'a Population<G, P>,
    ) -> Option<&'a Organism<G, P>> {
        self.champion.and_then(|idx| population.organisms.get(idx))
    }

    pub fn fill_population_statistics<G: Genome, P: Phenotype>(
        &mut self,
        population: &Population<G, P>,
    ) {
        let organisms = &population.organisms;
        self.stats = Some(PopulationStats {
            fitness: Floats::new(organisms.iter().map(|o| o.fitness)),
            error: Floats::new(organisms.iter().map(|o| o.error)),
            complexity: Floats::new(organisms.iter().map(|o| o.genome.complexity() as f64)),
            species: population.species.len(),
        });
    }
}
