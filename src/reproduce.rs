//! Functions related to reproducing on the specie and global population scale.

use crate::{
    error::ReproductionError,
    genome::{Genome, InnoGen, WeightMutation},
    random::{EvolutionEvent, Happens},
};
use core::{cmp::Ordering, f64};
use rand::{Rng, RngCore};

/// Select a random genome with probability weighted by fitness.
/// Fitness values are shifted so negative fitnesses are handled properly.
fn weighted_random_select<'a, G>(
    genomes: &'a [(&'a G, f64)],
    rng: &mut impl RngCore,
) -> Option<&'a (&'a G, f64)> {
    let min_fitness = genomes
        .iter()
        .map(|(_, f)| *f)
        .fold(None, |acc: Option<f64>, f| Some(acc.map_or(f, |m| m.min(f))))?;

    // shifted non-negative, epsilon keeps an all-zero population selectable
    let shift = if min_fitness < 0.0 { -min_fitness } else { 0.0 };
    let epsilon = 1e-6;

    let weights: Vec<f64> = genomes.iter().map(|(_, f)| f + shift + epsilon).collect();

    let total_weight: f64 = weights.iter().sum();
    let mut threshold = rng.random::<f64>() * total_weight;

    for (i, weight) in weights.iter().enumerate() {
        threshold -= weight;
        if threshold <= 0.0 {
            return Some(&genomes[i]);
        }
    }

    genomes.last()
}

fn reproduce_crossover<G: Genome>(
    genomes: &[(&G, f64)],
    size: usize,
    rng: &mut impl Happens,
    innogen: &mut InnoGen,
    how: WeightMutation,
) -> Result<Vec<G>, ReproductionError> {
    if size == 0 {
        return Ok(vec![]);
    }

    if genomes.len() < 2 {
        return Err(ReproductionError::TooFewMembers {
            action: "crossover",
            wanted: size,
            have: genomes.len(),
        });
    }

    (0..size)
        .map(|_| {
            let (l, l_fit) = weighted_random_select(genomes, rng).ok_or(ReproductionError::Extinct)?;
            let (r, r_fit) = weighted_random_select(genomes, rng).ok_or(ReproductionError::Extinct)?;
            let ordering = l_fit.partial_cmp(r_fit).unwrap_or(Ordering::Equal);

            let mut child = l.reproduce_with(r, ordering, rng);
            child.mutate(rng, innogen, how);
            Ok(child)
        })
        .collect()
}

fn reproduce_copy<G: Genome>(
    genomes: &[(&G, f64)],
    size: usize,
    rng: &mut impl Happens,
    innogen: &mut InnoGen,
    how: WeightMutation,
) -> Result<Vec<G>, ReproductionError> {
    if size == 0 {
        return Ok(vec![]);
    }

    (0..size)
        .map(|_| {
            let (genome, _) = weighted_random_select(genomes, rng).ok_or(
                ReproductionError::TooFewMembers {
                    action: "copy",
                    wanted: size,
                    have: genomes.len(),
                },
            )?;
            let mut child = (*genome).clone();
            child.mutate(rng, innogen, how);
            Ok(child)
        })
        .collect()
}

/// Produce `size` children from the fitted `genomes` of one specie. With `elite`, the fittest
/// genome is carried over unchanged as the first child. Of the rest, each is a mutated copy
/// with [EvolutionEvent::MutateOnly] chance, or a mutated crossover child otherwise.
pub fn reproduce<G: Genome>(
    genomes: &[(&G, f64)],
    size: usize,
    elite: bool,
    innogen: &mut InnoGen,
    how: WeightMutation,
    rng: &mut impl Happens,
) -> Result<Vec<G>, ReproductionError> {
    if size == 0 {
        return Ok(vec![]);
    }

    if genomes.is_empty() {
        return Err(ReproductionError::TooFewMembers {
            action: "reproduce",
            wanted: size,
            have: 0,
        });
    }

    let mut pop: Vec<G> = Vec::with_capacity(size);
    if elite {
        if let Some((champion, _)) = genomes
            .iter()
            .max_by(|(_, l), (_, r)| l.partial_cmp(r).unwrap_or(Ordering::Equal))
        {
            pop.push((*champion).clone());
        }
    }

    let size = size - pop.len();
    let size_copy = if genomes.len() == 1 {
        size
    } else {
        (0..size)
            .filter(|_| rng.happens(EvolutionEvent::MutateOnly))
            .count()
    };

    pop.extend(reproduce_copy(genomes, size_copy, rng, innogen, how)?);
    pop.extend(reproduce_crossover(
        genomes,
        size - size_copy,
        rng,
        innogen,
        how,
    )?);

    Ok(pop)
}

/// Split `population` offspring between species proportionally to their adjusted fitness. The
/// largest remainders take the seats rounding leaves over, so the result always sums to
/// `population`. Species with no fitness at all share equally.
pub fn population_alloc(fit_adjusted: &[f64], population: usize) -> Vec<usize> {
    if fit_adjusted.is_empty() {
        return vec![];
    }

    let fit_total: f64 = fit_adjusted.iter().map(|f| f.max(0.)).sum();
    let shares: Vec<f64> = if fit_total > 0. && fit_total.is_finite() {
        fit_adjusted
            .iter()
            .map(|f| population as f64 * f.max(0.) / fit_total)
            .collect()
    } else {
        vec![population as f64 / fit_adjusted.len() as f64; fit_adjusted.len()]
    };

    let mut alloc: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();
    let mut by_remainder: Vec<usize> = (0..shares.len()).collect();
    by_remainder.sort_by(|&l, &r| {
        (shares[r] - shares[r].floor())
            .partial_cmp(&(shares[l] - shares[l].floor()))
            .unwrap_or(Ordering::Equal)
    });

    let assigned: usize = alloc.iter().sum();
    for idx in by_remainder
        .into_iter()
        .cycle()
        .take(population.saturating_sub(assigned))
    {
        alloc[idx] += 1;
    }

    alloc
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        genome::{Recurrent, WConnection},
        random::{percent, ProbBinding, ProbStatic, WyRng},
        test_t,
    };

    type BasicGenome = Recurrent<WConnection>;

    fn rng() -> ProbBinding<ProbStatic, WyRng> {
        ProbBinding::new(ProbStatic::default(), WyRng::seeded(42))
    }

    test_t!(specie_reproduce[T: BasicGenome]() {
        let mut rng = rng();
        let (genome, innogen) = T::fully_connected(2, 1);
        let members = vec![(&genome, 1.), (&genome, 2.), (&genome, 3.)];

        for i in [0, 1, 40, 400] {
            assert_eq!(
                i,
                reproduce(
                    &members,
                    i,
                    true,
                    &mut innogen.clone(),
                    WeightMutation::default(),
                    &mut rng
                )
                .unwrap()
                .len()
            );
        }
    });

    test_t!(reproduce_single_member[T: BasicGenome]() {
        let mut rng = ProbBinding::new(
            ProbStatic::default().with_overrides(&[(EvolutionEvent::MutateOnly, percent(0))]),
            WyRng::seeded(7),
        );
        let (genome, mut innogen) = T::fully_connected(2, 1);
        let children = reproduce(
            &[(&genome, 1.)],
            10,
            false,
            &mut innogen,
            WeightMutation::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(10, children.len());
    });

    test_t!(reproduce_elite_is_unchanged[T: BasicGenome]() {
        let mut rng = ProbBinding::new(
            ProbStatic::default().with_overrides(&[(EvolutionEvent::MutateWeight, percent(100))]),
            WyRng::seeded(3),
        );
        let (weak, mut innogen) = T::fully_connected(2, 1);
        let mut strong = weak.clone();
        strong.connections_mut()[0].weight = 9.;

        let children = reproduce(
            &[(&weak, 1.), (&strong, 5.)],
            5,
            true,
            &mut innogen,
            WeightMutation::default(),
            &mut rng,
        )
        .unwrap();
        assert_eq!(strong.connections(), children[0].connections());
    });

    #[test]
    fn test_reproduce_empty() {
        let mut rng = rng();
        let members: Vec<(&BasicGenome, f64)> = vec![];
        assert!(matches!(
            reproduce(
                &members,
                3,
                true,
                &mut InnoGen::new(0),
                WeightMutation::default(),
                &mut rng
            ),
            Err(ReproductionError::TooFewMembers { have: 0, .. })
        ));
    }

    #[test]
    fn test_weighted_select_prefers_fit() {
        let (a, _) = BasicGenome::new(2, 1);
        let (mut b, _) = BasicGenome::new(2, 1);
        b.set_id(1);
        let genomes = vec![(&a, 0.), (&b, 100.)];
        let mut rng = WyRng::seeded(11);
        let picked_b = (0..1000)
            .filter(|_| weighted_random_select(&genomes, &mut rng).unwrap().0.id() == 1)
            .count();
        assert!(picked_b > 950);
    }

    #[test]
    fn test_population_alloc_sums() {
        for (fits, population) in [
            (vec![1., 1., 1.], 10),
            (vec![0.3, 2.5, 7.1, 0.], 150),
            (vec![0., 0.], 7),
            (vec![4.], 1),
        ] {
            let alloc = population_alloc(&fits, population);
            assert_eq!(fits.len(), alloc.len());
            assert_eq!(population, alloc.iter().sum::<usize>());
        }
    }

    #[test]
    fn test_population_alloc_proportional() {
        assert_eq!(vec![25, 75], population_alloc(&[1., 3.], 100));
        assert_eq!(vec![0, 10], population_alloc(&[0., 2.], 10));
    }
}
