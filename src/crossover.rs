//! Innovation-aligned crossover between two connection lists, and the compatibility distance
//! that speciation partitions genomes by.

use crate::{
    genome::Connection,
    options::Options,
    random::{EvolutionEvent, Happens},
};
use core::cmp::{max, Ordering};
use fxhash::FxHashMap;

/// Coefficients weighing the three terms of [delta]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compat {
    pub excess: f64,
    pub disjoint: f64,
    pub weight: f64,
    /// Genomes shorter than this are not normalized by their size
    pub normalize_over: usize,
}

impl Default for Compat {
    fn default() -> Self {
        Self::from(&Options::default())
    }
}

impl From<&Options> for Compat {
    fn from(options: &Options) -> Self {
        Self {
            excess: options.excess_coefficient,
            disjoint: options.disjoint_coefficient,
            weight: options.weight_coefficient,
            normalize_over: crate::constants::NEATXOR_NORMALIZATION_THRESHOLD,
        }
    }
}

/// Count of (disjoint, excess) genes between l and r. Excess genes are those whose innovation
/// id lies beyond the other genome's newest gene
pub fn disjoint_excess_count<C: Connection>(l: &[C], r: &[C]) -> (usize, usize) {
    let l_max = l.iter().map(|c| c.inno()).max();
    let r_max = r.iter().map(|c| c.inno()).max();
    let (l_max, r_max) = match (l_max, r_max) {
        (None, None) => return (0, 0),
        (None, Some(_)) => return (0, r.len()),
        (Some(_), None) => return (0, l.len()),
        (Some(l_max), Some(r_max)) => (l_max, r_max),
    };

    let l_innos = l.iter().map(|c| c.inno()).collect::<fxhash::FxHashSet<_>>();
    let r_innos = r.iter().map(|c| c.inno()).collect::<fxhash::FxHashSet<_>>();

    let mut disjoint = 0;
    let mut excess = 0;
    for inno in l_innos.difference(&r_innos) {
        if *inno > r_max {
            excess += 1
        } else {
            disjoint += 1
        }
    }
    for inno in r_innos.difference(&l_innos) {
        if *inno > l_max {
            excess += 1
        } else {
            disjoint += 1
        }
    }

    (disjoint, excess)
}

/// Mean parameter difference over genes both sides share. 0 if they share none
pub fn avg_param_diff<C: Connection>(l: &[C], r: &[C]) -> f64 {
    let r_by_inno = r
        .iter()
        .map(|c| (c.inno(), c))
        .collect::<FxHashMap<_, _>>();

    let (count, sum) = l
        .iter()
        .filter_map(|c| r_by_inno.get(&c.inno()).map(|o| c.param_diff(o)))
        .fold((0usize, 0.), |(n, s), d| (n + 1, s + d));

    if count == 0 {
        0.
    } else {
        sum / count as f64
    }
}

/// Compatibility distance between two genomes' connections
pub fn delta<C: Connection>(l: &[C], r: &[C], compat: Compat) -> f64 {
    let size = max(l.len(), r.len());
    let norm = if size < compat.normalize_over {
        1.
    } else {
        size as f64
    };
    let (disjoint, excess) = disjoint_excess_count(l, r);

    compat.excess * excess as f64 / norm
        + compat.disjoint * disjoint as f64 / norm
        + compat.weight * avg_param_diff(l, r)
}

/// Cross l with r, where l's fitness is `l_fit` compared to r. The child carries the structure
/// of the fitter parent, l when they are equal. Genes both parents share are picked from either
/// at random, and a gene disabled in either parent is kept disabled with some probability.
pub fn crossover<C: Connection>(
    l: &[C],
    r: &[C],
    l_fit: Ordering,
    rng: &mut impl Happens,
) -> Vec<C> {
    let (fit, unfit) = if l_fit == Ordering::Less {
        (r, l)
    } else {
        (l, r)
    };

    let unfit_by_inno = unfit
        .iter()
        .map(|c| (c.inno(), c))
        .collect::<FxHashMap<_, _>>();

    fit.iter()
        .map(|c| match unfit_by_inno.get(&c.inno()) {
            Some(o) => {
                let mut child = if rng.happens(EvolutionEvent::PickLess) {
                    (*o).clone()
                } else {
                    c.clone()
                };
                if !c.enabled() || !o.enabled() {
                    if rng.happens(EvolutionEvent::KeepDisabled) {
                        child.disable();
                    } else {
                        child.enable();
                    }
                }
                child
            }
            None => c.clone(),
        })
        .collect()
}
