use super::{Activation, FromGenome, Phenotype, PhenotypeError};
use crate::{
    genome::{Connection, Genome},
    serialize::{deserialize_matrix_flat, deserialize_matrix_square, serialize_matrix},
};
use core::{cmp::max, ops::Range};
use rulinalg::matrix::{BaseMatrix, Matrix};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A network whose nodes all update at once, every step reading the state left by the step
/// before it. A node carries no signal until one of its sources does, so a signal needs as
/// many steps as links on its path to reach an output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SynchronousRepr")]
pub struct Synchronous {
    /// 1d state of neurons 0-N
    #[serde(serialize_with = "serialize_matrix")]
    pub y: Matrix<f64>,
    /// Nd weights between neurons, indexed as [from, to]
    #[serde(serialize_with = "serialize_matrix")]
    pub w: Matrix<f64>,
    /// Enabled links as (from, to)
    pub links: Vec<(usize, usize)>,
    /// Whether a signal has reached each neuron since the last flush
    pub active: Vec<bool>,
    /// Range of input neurons, bias first, indexing into y
    pub inputs: Range<usize>,
    /// Range of output neurons, indexing into y
    pub action: Range<usize>,
    pub σ: Activation,
}

#[derive(Deserialize)]
struct SynchronousRepr {
    #[serde(deserialize_with = "deserialize_matrix_flat")]
    y: Matrix<f64>,
    #[serde(deserialize_with = "deserialize_matrix_square")]
    w: Matrix<f64>,
    links: Vec<(usize, usize)>,
    active: Vec<bool>,
    inputs: Range<usize>,
    action: Range<usize>,
    σ: Activation,
}

/// A serialized network whose parts disagree on its size
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("{part} holds {got} neurons, weights are for {size}")]
    Length {
        part: &'static str,
        got: usize,
        size: usize,
    },
    #[error("{part} range {start}..{end} does not fit {size} neurons")]
    Range {
        part: &'static str,
        start: usize,
        end: usize,
        size: usize,
    },
    #[error("link {from} -> {to} does not fit {size} neurons")]
    Link { from: usize, to: usize, size: usize },
}

impl TryFrom<SynchronousRepr> for Synchronous {
    type Error = ShapeError;

    fn try_from(repr: SynchronousRepr) -> Result<Self, Self::Error> {
        let size = repr.w.cols();
        for (part, got) in [("state", repr.y.cols()), ("activity", repr.active.len())] {
            if got != size {
                return Err(ShapeError::Length { part, got, size });
            }
        }
        for (part, range) in [("input", &repr.inputs), ("action", &repr.action)] {
            if range.start > range.end || range.end > size {
                return Err(ShapeError::Range {
                    part,
                    start: range.start,
                    end: range.end,
                    size,
                });
            }
        }
        if let Some(&(from, to)) = repr.links.iter().find(|(f, t)| *f >= size || *t >= size) {
            return Err(ShapeError::Link { from, to, size });
        }

        Ok(Self {
            y: repr.y,
            w: repr.w,
            links: repr.links,
            active: repr.active,
            inputs: repr.inputs,
            action: repr.action,
            σ: repr.σ,
        })
    }
}

impl Synchronous {
    #[inline]
    fn size(&self) -> usize {
        self.active.len()
    }

    fn incoming(&self) -> Vec<Vec<usize>> {
        let mut incoming = vec![vec![]; self.size()];
        for &(from, to) in &self.links {
            incoming[to].push(from);
        }
        incoming
    }
}

/// Longest path ending at `node`, skipping any link back to a node still being walked.
/// `colour` is 0 unvisited, 1 on the current path, 2 done
fn depth_of(node: usize, incoming: &[Vec<usize>], colour: &mut [u8], memo: &mut [usize]) -> usize {
    colour[node] = 1;
    let mut best = 0;
    for &from in &incoming[node] {
        match colour[from] {
            1 => continue,
            0 => {
                depth_of(from, incoming, colour, memo);
            }
            _ => {}
        }
        best = max(best, memo[from] + 1);
    }
    colour[node] = 2;
    memo[node] = best;
    best
}

impl Phenotype for Synchronous {
    fn max_activation_depth(&self, limit: usize) -> Result<usize, PhenotypeError> {
        let incoming = self.incoming();
        let mut colour = vec![0u8; self.size()];
        let mut memo = vec![0usize; self.size()];

        let depth = self.action.clone().fold(0, |acc, out| {
            let d = if colour[out] == 2 {
                memo[out]
            } else {
                depth_of(out, &incoming, &mut colour, &mut memo)
            };
            max(acc, d)
        });

        if limit > 0 && depth > limit {
            Err(PhenotypeError::DepthExceeded { depth, limit })
        } else {
            Ok(depth)
        }
    }

    fn load_sensors(&mut self, inputs: &[f64]) -> Result<(), PhenotypeError> {
        if inputs.len() != self.inputs.len() {
            return Err(PhenotypeError::SensorCount {
                expected: self.inputs.len(),
                got: inputs.len(),
            });
        }
        if let Some((index, &value)) = inputs.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(PhenotypeError::NonFiniteInput { index, value });
        }

        self.y.mut_data()[self.inputs.clone()].copy_from_slice(inputs);
        for i in self.inputs.clone() {
            self.active[i] = true;
        }
        Ok(())
    }

    fn forward_steps(&mut self, steps: usize) -> Result<bool, PhenotypeError> {
        if steps == 0 {
            return Err(PhenotypeError::ZeroSteps);
        }

        for _ in 0..steps {
            let sums = &self.y * &self.w;

            let mut active = self.active.clone();
            for &(from, to) in &self.links {
                if self.active[from] {
                    active[to] = true;
                }
            }

            let σ = self.σ;
            let inputs = self.inputs.clone();
            for (i, (y, sum)) in self
                .y
                .mut_data()
                .iter_mut()
                .zip(sums.data().iter())
                .enumerate()
            {
                if inputs.contains(&i) {
                    continue;
                }
                *y = if active[i] { σ.apply(*sum) } else { 0. };
            }
            self.active = active;
        }

        Ok(self.action.clone().all(|i| self.active[i]))
    }

    fn flush(&mut self) -> Result<(), PhenotypeError> {
        self.y = Matrix::zeros(1, self.size());
        self.active = vec![false; self.size()];
        Ok(())
    }

    fn outputs(&self) -> &[f64] {
        &self.y.data()[self.action.clone()]
    }
}

impl<G: Genome> FromGenome<G> for Synchronous {
    fn from_genome(genome: &G, σ: Activation) -> Self {
        let cols = genome.nodes().len();
        let mut w = vec![0.; cols * cols];
        let mut links = Vec::with_capacity(genome.extrons());
        for c in genome.connections().iter().filter(|c| c.enabled()) {
            w[c.from() * cols + c.to()] += c.weight();
            links.push((c.from(), c.to()));
        }

        Self {
            y: Matrix::zeros(1, cols),
            w: Matrix::new(cols, cols, w),
            links,
            active: vec![false; cols],
            inputs: genome.inputs(),
            action: genome.action(),
            σ,
        }
    }
}
