//! Partitioning a population into species of closely related genomes.

use crate::{
    crossover::{delta, Compat},
    genome::Connection,
};
use core::hash::{Hash, Hasher};

/// The representative member of a particular specie. Is retained inter-generationally to better
/// track when a specie deviates
#[derive(Debug, Clone)]
pub struct SpecieRepr<C: Connection>(Vec<C>);

impl<C: Connection> SpecieRepr<C> {
    pub fn new(v: Vec<C>) -> Self {
        Self(v)
    }

    fn delta(&self, other: &[C], compat: Compat) -> f64 {
        delta(&self.0, other, compat)
    }
}

impl<C: Connection> Hash for SpecieRepr<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<C: Connection> AsRef<[C]> for SpecieRepr<C> {
    fn as_ref(&self) -> &[C] {
        &self.0
    }
}

/// A group of organisms, by their index in the population, who are closely related to the same
/// [SpecieRepr]
#[derive(Debug, Clone)]
pub struct Specie<C: Connection> {
    pub id: usize,
    pub repr: SpecieRepr<C>,
    pub members: Vec<usize>,
}

impl<C: Connection> Specie<C> {
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Partition genomes, given by their connections in population order, into species. An initial
/// collection of empty species is created from `reprs`, and if some genome matches none of
/// them, a new specie is formed with it as the repr and the id taken from `next_id`. Species
/// left without members are dropped.
pub fn speciate<'a, C: Connection + 'a>(
    genomes: impl Iterator<Item = &'a [C]>,
    reprs: impl Iterator<Item = (usize, SpecieRepr<C>)>,
    compat: Compat,
    threshold: f64,
    next_id: &mut usize,
) -> Vec<Specie<C>> {
    let mut sp = Vec::from_iter(reprs.map(|(id, repr)| Specie {
        id,
        repr,
        members: Vec::new(),
    }));

    for (idx, connections) in genomes.enumerate() {
        match sp
            .iter_mut()
            .find(|Specie { repr, .. }| repr.delta(connections, compat) < threshold)
        {
            Some(Specie { members, .. }) => members.push(idx),
            None => {
                sp.push(Specie {
                    id: *next_id,
                    repr: SpecieRepr::new(connections.to_vec()),
                    members: vec![idx],
                });
                *next_id += 1;
            }
        }
    }

    sp.retain(|s| !s.is_empty());
    sp
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::genome::WConnection;
    use core::iter::empty;

    fn genome(innos: &[usize]) -> Vec<WConnection> {
        innos
            .iter()
            .map(|&inno| WConnection {
                inno,
                from: 0,
                to: inno + 1,
                weight: 1.,
                enabled: true,
            })
            .collect()
    }

    #[test]
    fn test_speciate_identical() {
        let g = genome(&[0, 1, 2]);
        let mut next_id = 0;
        let species = speciate(
            [g.as_slice(), g.as_slice(), g.as_slice()].into_iter(),
            empty(),
            Compat::default(),
            3.,
            &mut next_id,
        );

        assert_eq!(1, species.len());
        assert_eq!(vec![0, 1, 2], species[0].members);
        assert_eq!(0, species[0].id);
        assert_eq!(1, next_id);
    }

    #[test]
    fn test_speciate_distant() {
        let l = genome(&[0, 1, 2]);
        let r = genome(&[3, 4, 5, 6, 7]);
        let mut next_id = 10;
        let species = speciate(
            [l.as_slice(), r.as_slice(), l.as_slice()].into_iter(),
            empty(),
            Compat::default(),
            3.,
            &mut next_id,
        );

        assert_eq!(2, species.len());
        assert_eq!(vec![0, 2], species[0].members);
        assert_eq!(vec![1], species[1].members);
        assert_eq!((10, 11), (species[0].id, species[1].id));
        assert_eq!(12, next_id);
    }

    #[test]
    fn test_speciate_keeps_repr_ids() {
        let l = genome(&[0, 1, 2]);
        let r = genome(&[3, 4, 5, 6, 7]);
        let mut next_id = 5;
        let species = speciate(
            [l.as_slice()].into_iter(),
            [(2, SpecieRepr::new(r.clone())), (3, SpecieRepr::new(l.clone()))].into_iter(),
            Compat::default(),
            3.,
            &mut next_id,
        );

        assert_eq!(1, species.len());
        assert_eq!(3, species[0].id);
        assert_eq!(vec![0], species[0].members);
        assert_eq!(5, next_id);
    }
}
