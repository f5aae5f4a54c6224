//! Organisms, and managing them at the global population scale: spawning the first generation
//! from a start genome, speciating, and reproducing into the next generation.

use crate::{
    crossover::Compat,
    error::ReproductionError,
    genome::{Connection, Genome, InnoGen, WeightMutation},
    network::{Activation, FromGenome, Phenotype, ToNetwork},
    options::Options,
    random::Happens,
    reproduce::{population_alloc, reproduce},
    specie::{speciate, Specie},
};
use core::cmp::Ordering;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One member of a population: a genome, the network built from it, and the scores the last
/// evaluation left on it
#[derive(Debug, Clone)]
pub struct Organism<G: Genome, P: Phenotype> {
    pub genome: G,
    pub phenotype: P,
    pub fitness: f64,
    pub error: f64,
    pub is_winner: bool,
}

impl<G: Genome, P: Phenotype> Organism<G, P> {
    pub fn new(genome: G, phenotype: P) -> Self {
        Self {
            genome,
            phenotype,
            fitness: 0.,
            error: 0.,
            is_winner: false,
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.genome.id()
    }
}

/// Every organism of one generation, partitioned into species
#[derive(Debug)]
pub struct Population<G: Genome, P: Phenotype> {
    pub organisms: Vec<Organism<G, P>>,
    pub species: Vec<Specie<G::Connection>>,
    pub innogen: InnoGen,
    next_specie: usize,
}

/// Build one organism per genome, numbering them by their position
fn organisms<G, P>(genomes: Vec<G>, σ: Activation) -> Vec<Organism<G, P>>
where
    G: Genome,
    P: FromGenome<G> + Send,
{
    let genomes = genomes
        .into_iter()
        .enumerate()
        .map(|(id, mut genome)| {
            genome.set_id(id);
            genome
        })
        .collect::<Vec<_>>();

    #[cfg(feature = "parallel")]
    let phenotypes = genomes.par_iter().map(|g| g.network(σ)).collect::<Vec<P>>();
    #[cfg(not(feature = "parallel"))]
    let phenotypes = genomes.iter().map(|g| g.network(σ)).collect::<Vec<P>>();

    genomes
        .into_iter()
        .zip(phenotypes)
        .map(|(genome, phenotype)| Organism::new(genome, phenotype))
        .collect()
}

impl<G: Genome, P: Phenotype> Population<G, P> {
    /// A population from already built organisms, speciated from scratch
    pub fn new(organisms: Vec<Organism<G, P>>, innogen: InnoGen, options: &Options) -> Self {
        let mut population = Self {
            organisms,
            species: vec![],
            innogen,
            next_specie: 0,
        };
        population.speciate(options);
        population
    }

    /// The first generation: `pop_size` copies of `start`, each with its weights perturbed
    pub fn spawn(start: &G, options: &Options, rng: &mut impl Happens, σ: Activation) -> Self
    where
        P: FromGenome<G> + Send,
    {
        let how = WeightMutation::from(options);
        let genomes = (0..options.pop_size)
            .map(|_| {
                let mut genome = start.clone();
                genome.mutate_params(rng, how);
                genome
            })
            .collect::<Vec<_>>();

        let head = start
            .connections()
            .iter()
            .map(|c| c.inno() + 1)
            .max()
            .unwrap_or(0);

        Self::new(organisms(genomes, σ), InnoGen::new(head), options)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.organisms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.organisms.is_empty()
    }

    /// Re-partition organisms, keeping the representatives of the current species so specie
    /// ids persist across generations
    pub fn speciate(&mut self, options: &Options) {
        let reprs = std::mem::take(&mut self.species)
            .into_iter()
            .map(|s| (s.id, s.repr));
        self.species = speciate(
            self.organisms.iter().map(|o| o.genome.connections()),
            reprs,
            Compat::from(options),
            options.compat_threshold,
            &mut self.next_specie,
        );
    }

    /// Specie id of every organism, in population order
    pub fn specie_of(&self) -> Vec<usize> {
        let mut ids = vec![0; self.organisms.len()];
        for specie in self.species.iter() {
            for &idx in specie.members.iter() {
                ids[idx] = specie.id;
            }
        }
        ids
    }

    /// Reproduce the evaluated population into the next generation. Each specie keeps its
    /// fittest `survival_threshold` share as parents, and is allotted offspring in proportion
    /// to its mean fitness. Species of at least `elitism_min_specie` members carry their
    /// champion over unchanged.
    pub fn epoch(
        mut self,
        options: &Options,
        rng: &mut impl Happens,
        σ: Activation,
    ) -> Result<Self, ReproductionError>
    where
        P: FromGenome<G> + Send,
    {
        if self.species.is_empty() {
            return Err(ReproductionError::Extinct);
        }

        let survivors = self
            .species
            .iter()
            .map(|specie| {
                let mut members = specie
                    .members
                    .iter()
                    .map(|&idx| (&self.organisms[idx].genome, self.organisms[idx].fitness))
                    .collect::<Vec<_>>();
                members.sort_by(|(_, l), (_, r)| r.partial_cmp(l).unwrap_or(Ordering::Equal));
                let keep = ((members.len() as f64 * options.survival_threshold).ceil() as usize)
                    .clamp(1, members.len());
                members.truncate(keep);
                (members, specie.len() >= options.elitism_min_specie)
            })
            .collect::<Vec<_>>();

        let fit_adjusted = self
            .species
            .iter()
            .map(|specie| {
                let l = specie.len() as f64;
                specie
                    .members
                    .iter()
                    .fold(0., |acc, &idx| acc + self.organisms[idx].fitness / l)
            })
            .collect::<Vec<_>>();
        let alloc = population_alloc(&fit_adjusted, options.pop_size);

        let how = WeightMutation::from(options);
        let mut genomes = Vec::with_capacity(options.pop_size);
        for ((members, elite), size) in survivors.iter().zip(alloc) {
            genomes.extend(reproduce(members, size, *elite, &mut self.innogen, how, rng)?);
        }
        debug!(
            species = self.species.len(),
            offspring = genomes.len(),
            inno_head = self.innogen.head,
            "population reproduced"
        );

        self.organisms = organisms(genomes, σ);
        self.speciate(options);
        Ok(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        genome::{Recurrent, WConnection},
        network::Synchronous,
        random::{ProbBinding, ProbStatic, WyRng},
    };

    type G = Recurrent<WConnection>;

    fn options() -> Options {
        Options {
            pop_size: 30,
            ..Options::default()
        }
    }

    fn rng() -> ProbBinding<ProbStatic, WyRng> {
        ProbBinding::new(ProbStatic::default(), WyRng::seeded(1234))
    }

    fn spawn() -> Population<G, Synchronous> {
        let (start, _) = G::fully_connected(2, 1);
        Population::spawn(&start, &options(), &mut rng(), Activation::default())
    }

    #[test]
    fn test_spawn() {
        let population = spawn();
        assert_eq!(30, population.len());
        for (idx, organism) in population.organisms.iter().enumerate() {
            assert_eq!(idx, organism.id());
            assert_eq!(3, organism.genome.connections().len());
        }
        assert_eq!(
            30,
            population.species.iter().map(|s| s.len()).sum::<usize>()
        );
        assert!(population.innogen.head >= 3);
    }

    #[test]
    fn test_specie_of_covers_all() {
        let population = spawn();
        let ids = population.specie_of();
        assert_eq!(30, ids.len());
        for specie in population.species.iter() {
            for &idx in specie.members.iter() {
                assert_eq!(specie.id, ids[idx]);
            }
        }
    }

    #[test]
    fn test_epoch_keeps_size() {
        let options = options();
        let mut rng = rng();
        let mut population = spawn();
        for generation in 0..5 {
            for (idx, organism) in population.organisms.iter_mut().enumerate() {
                organism.fitness = (idx % 7) as f64 + generation as f64;
            }
            population = population
                .epoch(&options, &mut rng, Activation::default())
                .unwrap();
            assert_eq!(30, population.len());
            assert!(population
                .organisms
                .iter()
                .enumerate()
                .all(|(idx, o)| o.id() == idx && o.fitness == 0.));
        }
    }

    #[test]
    fn test_epoch_zero_fitness() {
        let population = spawn();
        let population = population
            .epoch(&options(), &mut rng(), Activation::default())
            .unwrap();
        assert_eq!(30, population.len());
    }
}
