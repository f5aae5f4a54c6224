//! The XOR task: score a network on the four rows of the XOR truth table.

use crate::{
    constants::NEATXOR_XOR_FITNESS_THRESHOLD,
    context::Context,
    error::EvaluationError,
    experiment::{Generation, GenerationEvaluator},
    genome::Genome,
    network::{Phenotype, PhenotypeError},
    population::{Organism, Population},
};
use tracing::{debug, info, warn};

/// Input patterns, bias first, in truth table order
pub const XOR_PATTERNS: [[f64; 3]; 4] = [
    [1.0, 0.0, 0.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 0.0],
    [1.0, 1.0, 1.0],
];

#[derive(Debug, Clone, Copy, Default)]
pub struct XorGenerationEvaluator;

impl XorGenerationEvaluator {
    /// Score one organism, writing its fitness, error and winner flag. A network with zero
    /// activation depth is left untouched and never wins.
    pub fn evaluate<G: Genome, P: Phenotype>(
        &self,
        organism: &mut Organism<G, P>,
        depth_limit: usize,
    ) -> Result<bool, EvaluationError> {
        let id = organism.id();
        let depth = match organism.phenotype.max_activation_depth(depth_limit) {
            Ok(depth) => depth,
            Err(PhenotypeError::DepthExceeded { depth, limit }) => {
                warn!(
                    organism = id,
                    depth, limit, "network is deeper than the limit, activating with the limit"
                );
                limit
            }
            Err(source) => {
                return Err(EvaluationError::Depth {
                    organism: id,
                    source,
                })
            }
        };
        debug!(organism = id, depth, "network depth");
        if depth == 0 {
            debug!(organism = id, "network depth is zero, not evaluated");
            return Ok(false);
        }

        let phenotype = &mut organism.phenotype;
        let mut settled = false;
        let mut out = [0.; 4];
        for (pattern, slot) in XOR_PATTERNS.iter().zip(out.iter_mut()) {
            phenotype
                .load_sensors(pattern)
                .map_err(|source| EvaluationError::SensorLoad {
                    organism: id,
                    source,
                })?;

            // only the last pattern decides whether the network settled
            settled = phenotype
                .forward_steps(depth)
                .map_err(|source| EvaluationError::Propagation {
                    organism: id,
                    source,
                })?;
            *slot = phenotype.outputs().first().copied().ok_or_else(|| {
                EvaluationError::Propagation {
                    organism: id,
                    source: PhenotypeError::Backend("network has no outputs".to_string()),
                }
            })?;

            phenotype.flush().map_err(|source| EvaluationError::Flush {
                organism: id,
                source,
            })?;
        }

        if settled {
            let error_sum = out[0].abs() + (1. - out[1]).abs() + (1. - out[2]).abs() + out[3].abs();
            let target = 4. - error_sum;
            organism.fitness = (4. - error_sum).powi(2);
            organism.error = (4. - target).powi(2);
        } else {
            organism.error = 1.;
            organism.fitness = 0.;
        }

        organism.is_winner = organism.fitness > NEATXOR_XOR_FITNESS_THRESHOLD;
        if organism.is_winner {
            info!(organism = id, outputs = ?out, "winner output activations");
        }

        Ok(organism.is_winner)
    }
}

impl<G: Genome, P: Phenotype> GenerationEvaluator<G, P> for XorGenerationEvaluator {
    fn generation_evaluate(
        &self,
        ctx: &Context,
        population: &mut Population<G, P>,
        generation: &mut Generation,
    ) -> Result<(), EvaluationError> {
        let options = ctx.options().ok_or(EvaluationError::ConfigurationMissing)?;
        if population.is_empty() {
            return Err(EvaluationError::EmptyPopulation);
        }

        for idx in 0..population.organisms.len() {
            let winner = self.evaluate(
                &mut population.organisms[idx],
                options.max_activation_depth,
            )?;

            let organism = &population.organisms[idx];
            let beats_champion = generation
                .champion(population)
                .map_or(true, |champion| organism.fitness > champion.fitness);
            if winner && beats_champion {
                generation.solved = true;
                generation.winner_nodes = organism.genome.nodes().len();
                generation.winner_genes = organism.genome.extrons();
                generation.winner_evals = options.pop_size * generation.id + organism.id();
                generation.champion = Some(idx);
            }
        }

        generation.fill_population_statistics(population);

        if let Some(champion) = generation.champion(population).filter(|_| generation.solved) {
            if let Ok(depth) = champion.phenotype.max_activation_depth(0) {
                info!(organism = champion.id(), depth, "activation depth of the winner");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        constants::NEATXOR_XOR_MAX_FITNESS,
        genome::{Recurrent, WConnection},
        options::Options,
    };
    use approx::assert_relative_eq;

    type G = Recurrent<WConnection>;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Stage {
        Load,
        Forward,
        Flush,
    }

    /// A network answering every truth table row with a fixed output
    #[derive(Debug, Clone)]
    struct Scripted {
        depth: Result<usize, PhenotypeError>,
        answers: [f64; 4],
        settled: [bool; 4],
        fail: Option<Stage>,
        row: usize,
        out: [f64; 1],
        steps: Vec<usize>,
        loads: usize,
    }

    impl Scripted {
        fn new(answers: [f64; 4]) -> Self {
            Self {
                depth: Ok(2),
                answers,
                settled: [true; 4],
                fail: None,
                row: 0,
                out: [0.],
                steps: vec![],
                loads: 0,
            }
        }

        fn failing(stage: Stage) -> Self {
            Self {
                fail: Some(stage),
                ..Self::new([0., 1., 1., 0.])
            }
        }

        fn check(&self, stage: Stage) -> Result<(), PhenotypeError> {
            match self.fail {
                Some(s) if s == stage => Err(PhenotypeError::Backend(format!("{stage:?} failed"))),
                _ => Ok(()),
            }
        }
    }

    impl Phenotype for Scripted {
        fn max_activation_depth(&self, _: usize) -> Result<usize, PhenotypeError> {
            self.depth.clone()
        }

        fn load_sensors(&mut self, inputs: &[f64]) -> Result<(), PhenotypeError> {
            self.check(Stage::Load)?;
            self.loads += 1;
            self.row = inputs[1] as usize * 2 + inputs[2] as usize;
            Ok(())
        }

        fn forward_steps(&mut self, steps: usize) -> Result<bool, PhenotypeError> {
            self.check(Stage::Forward)?;
            self.steps.push(steps);
            self.out[0] = self.answers[self.row];
            Ok(self.settled[self.row])
        }

        fn flush(&mut self) -> Result<(), PhenotypeError> {
            self.check(Stage::Flush)?;
            self.out[0] = 0.;
            Ok(())
        }

        fn outputs(&self) -> &[f64] {
            &self.out
        }
    }

    fn organism(id: usize, phenotype: Scripted) -> Organism<G, Scripted> {
        let (mut genome, _) = G::fully_connected(2, 1);
        genome.set_id(id);
        Organism::new(genome, phenotype)
    }

    fn population(phenotypes: Vec<Scripted>) -> Population<G, Scripted> {
        let organisms = phenotypes
            .into_iter()
            .enumerate()
            .map(|(id, p)| organism(id, p))
            .collect();
        Population::new(organisms, Default::default(), &Options::default())
    }

    fn ctx(pop_size: usize) -> Context {
        Context::background(Options {
            pop_size,
            ..Options::default()
        })
    }

    const PERFECT: [f64; 4] = [0., 1., 1., 0.];
    const INVERSE: [f64; 4] = [1., 0., 0., 1.];

    #[test]
    fn test_zero_depth_untouched() {
        let mut org = organism(0, Scripted::new(PERFECT));
        org.phenotype.depth = Ok(0);
        org.fitness = 7.;
        org.error = 3.;
        org.is_winner = true;

        assert!(!XorGenerationEvaluator.evaluate(&mut org, 0).unwrap());
        assert_eq!(7., org.fitness);
        assert_eq!(3., org.error);
        assert!(org.is_winner);
        assert_eq!(0, org.phenotype.loads);
    }

    #[test]
    fn test_perfect_xor() {
        let mut org = organism(0, Scripted::new(PERFECT));
        assert!(XorGenerationEvaluator.evaluate(&mut org, 0).unwrap());
        assert_relative_eq!(org.fitness, NEATXOR_XOR_MAX_FITNESS);
        assert_relative_eq!(org.error, 0.);
        assert!(org.is_winner);
        assert_eq!(vec![2; 4], org.phenotype.steps);
        assert_eq!(4, org.phenotype.loads);
    }

    #[test]
    fn test_inverse_xor() {
        let mut org = organism(0, Scripted::new(INVERSE));
        assert!(!XorGenerationEvaluator.evaluate(&mut org, 0).unwrap());
        assert_relative_eq!(org.fitness, 0.);
        assert_relative_eq!(org.error, 16.);
        assert!(!org.is_winner);
    }

    #[test]
    fn test_error_formula() {
        let mut org = organism(0, Scripted::new([0.25, 0.5, 1., 0.]));
        XorGenerationEvaluator.evaluate(&mut org, 0).unwrap();
        // error sum 0.75
        assert_relative_eq!(org.fitness, 3.25 * 3.25);
        assert_relative_eq!(org.error, 0.75 * 0.75);
        assert!(!org.is_winner);
    }

    #[test]
    fn test_fitness_monotonic() {
        let fitness = |answers| {
            let mut org = organism(0, Scripted::new(answers));
            XorGenerationEvaluator.evaluate(&mut org, 0).unwrap();
            org.fitness
        };

        let ladder = [
            PERFECT,
            [0.1, 0.9, 1., 0.],
            [0.2, 0.8, 0.9, 0.1],
            [0.5, 0.5, 0.5, 0.5],
            [0.9, 0.2, 0.1, 0.8],
            INVERSE,
        ];
        for pair in ladder.windows(2) {
            assert!(fitness(pair[0]) > fitness(pair[1]));
        }
    }

    #[test]
    fn test_near_perfect_threshold() {
        // error sum 0.06, fitness 15.5236
        let mut org = organism(0, Scripted::new([0.02, 0.98, 0.99, 0.01]));
        assert!(XorGenerationEvaluator.evaluate(&mut org, 0).unwrap());

        // error sum 0.08, fitness 15.3664
        let mut org = organism(0, Scripted::new([0.02, 0.98, 0.98, 0.02]));
        assert!(!XorGenerationEvaluator.evaluate(&mut org, 0).unwrap());
    }

    #[test]
    fn test_unsettled_last_pattern() {
        let mut phenotype = Scripted::new(PERFECT);
        phenotype.settled = [true, true, true, false];
        let mut org = organism(0, phenotype);
        org.is_winner = true;

        assert!(!XorGenerationEvaluator.evaluate(&mut org, 0).unwrap());
        assert_eq!(0., org.fitness);
        assert_eq!(1., org.error);
        assert!(!org.is_winner);
    }

    #[test]
    fn test_only_last_pattern_settles() {
        let mut phenotype = Scripted::new(PERFECT);
        phenotype.settled = [false, false, false, true];
        let mut org = organism(0, phenotype);

        assert!(XorGenerationEvaluator.evaluate(&mut org, 0).unwrap());
        assert_relative_eq!(org.fitness, 16.);
    }

    #[test]
    fn test_depth_exceeded_uses_limit() {
        let mut phenotype = Scripted::new(PERFECT);
        phenotype.depth = Err(PhenotypeError::DepthExceeded { depth: 9, limit: 3 });
        let mut org = organism(0, phenotype);

        assert!(XorGenerationEvaluator.evaluate(&mut org, 3).unwrap());
        assert_eq!(vec![3; 4], org.phenotype.steps);
    }

    #[test]
    fn test_depth_failure() {
        let mut phenotype = Scripted::new(PERFECT);
        phenotype.depth = Err(PhenotypeError::Backend("broken".to_string()));
        let mut org = organism(4, phenotype);

        assert!(matches!(
            XorGenerationEvaluator.evaluate(&mut org, 0),
            Err(EvaluationError::Depth { organism: 4, .. })
        ));
    }

    #[test]
    fn test_phenotype_failures() {
        for stage in [Stage::Load, Stage::Forward, Stage::Flush] {
            let mut org = organism(1, Scripted::failing(stage));
            let err = XorGenerationEvaluator.evaluate(&mut org, 0).unwrap_err();
            match (stage, err) {
                (Stage::Load, EvaluationError::SensorLoad { organism: 1, .. }) => {}
                (Stage::Forward, EvaluationError::Propagation { organism: 1, .. }) => {}
                (Stage::Flush, EvaluationError::Flush { organism: 1, .. }) => {}
                (stage, err) => panic!("{stage:?} produced {err}"),
            }
            assert!(!org.is_winner);
        }
    }

    #[test]
    fn test_generation_missing_options() {
        let (ctx, _cancel) = Context::with_cancel(None);
        let mut population = population(vec![Scripted::new(PERFECT)]);
        let mut generation = Generation::new(0, 0);

        assert!(matches!(
            XorGenerationEvaluator.generation_evaluate(&ctx, &mut population, &mut generation),
            Err(EvaluationError::ConfigurationMissing)
        ));
        assert!(generation.stats.is_none());
    }

    #[test]
    fn test_generation_empty_population() {
        let mut population = population(vec![]);
        let mut generation = Generation::new(0, 0);

        assert!(matches!(
            XorGenerationEvaluator.generation_evaluate(&ctx(0), &mut population, &mut generation),
            Err(EvaluationError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_generation_champion_strictly_greater() {
        let mut population = population(vec![
            Scripted::new([0.5, 0.5, 0.5, 0.5]),
            Scripted::new(PERFECT),
            Scripted::new(PERFECT),
            Scripted::new([0.01, 1., 1., 0.]),
        ]);
        let mut generation = Generation::new(0, 0);
        XorGenerationEvaluator
            .generation_evaluate(&ctx(4), &mut population, &mut generation)
            .unwrap();

        assert!(generation.solved);
        assert_eq!(Some(1), generation.champion);
        assert_eq!(4, generation.winner_nodes);
        assert_eq!(3, generation.winner_genes);
        assert_eq!(1, generation.winner_evals);
        assert!(population.organisms[2].is_winner);
        assert!(population.organisms[3].is_winner);
    }

    #[test]
    fn test_generation_later_better_winner() {
        let mut population = population(vec![
            Scripted::new([0.01, 1., 1., 0.]),
            Scripted::new(PERFECT),
        ]);
        let mut generation = Generation::new(0, 0);
        XorGenerationEvaluator
            .generation_evaluate(&ctx(2), &mut population, &mut generation)
            .unwrap();

        assert_eq!(Some(1), generation.champion);
    }

    #[test]
    fn test_generation_solved_is_sticky() {
        let mut population = population(vec![
            Scripted::new(PERFECT),
            Scripted::new(INVERSE),
            Scripted::new([0.5; 4]),
        ]);
        let mut generation = Generation::new(0, 0);
        XorGenerationEvaluator
            .generation_evaluate(&ctx(3), &mut population, &mut generation)
            .unwrap();

        assert!(generation.solved);
        assert_eq!(Some(0), generation.champion);
    }

    #[test]
    fn test_generation_winner_evals() {
        let pop_size = 150;
        let mut phenotypes = vec![Scripted::new(INVERSE); 8];
        phenotypes.push(Scripted::new(PERFECT));
        let mut population = population(phenotypes);
        let mut generation = Generation::new(7, 0);
        XorGenerationEvaluator
            .generation_evaluate(&ctx(pop_size), &mut population, &mut generation)
            .unwrap();

        assert_eq!(pop_size * 7 + 8, generation.winner_evals);
    }

    #[test]
    fn test_generation_no_winner() {
        let mut population = population(vec![Scripted::new(INVERSE), Scripted::new([0.5; 4])]);
        let mut generation = Generation::new(0, 0);
        XorGenerationEvaluator
            .generation_evaluate(&ctx(2), &mut population, &mut generation)
            .unwrap();

        assert!(!generation.solved);
        assert!(generation.champion.is_none());
        let stats = generation.stats.unwrap();
        assert_relative_eq!(stats.fitness.max, 4.);
        assert_relative_eq!(stats.fitness.mean, 2.);
        assert_eq!(1, stats.species);
    }

    #[test]
    fn test_generation_fails_fast() {
        let mut population = population(vec![
            Scripted::new(PERFECT),
            Scripted::failing(Stage::Forward),
            Scripted::new(PERFECT),
        ]);
        let mut generation = Generation::new(0, 0);

        assert!(matches!(
            XorGenerationEvaluator.generation_evaluate(&ctx(3), &mut population, &mut generation),
            Err(EvaluationError::Propagation { organism: 1, .. })
        ));
        assert!(generation.stats.is_none());
        assert_eq!(0, population.organisms[2].phenotype.loads);
    }
}
