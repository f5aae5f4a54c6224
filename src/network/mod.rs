//! Phenotypes: activatable networks constructed from [Genome]s. The evaluation code only ever
//! talks to a network through [Phenotype], so any network able to load inputs, step, flush and
//! report its outputs can be scored.

pub mod synchronous;

pub use synchronous::Synchronous;

use crate::genome::Genome;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod activate {
    use core::f64::consts::E;

    pub fn steep_sigmoid(x: f64) -> f64 {
        1. / (1. + E.powf(-4.9 * x))
    }

    pub fn relu(x: f64) -> f64 {
        if x < 0. {
            0.
        } else {
            x
        }
    }
}

/// Activation function of a network's non-input nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    #[default]
    SteepSigmoid,
    Relu,
    Identity,
}

impl Activation {
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::SteepSigmoid => activate::steep_sigmoid(x),
            Self::Relu => activate::relu(x),
            Self::Identity => x,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhenotypeError {
    #[error("expected {expected} sensor values, got {got}")]
    SensorCount { expected: usize, got: usize },
    #[error("sensor {index} got non-finite value {value}")]
    NonFiniteInput { index: usize, value: f64 },
    #[error("zero activation steps requested")]
    ZeroSteps,
    #[error("activation depth {depth} exceeds limit {limit}")]
    DepthExceeded { depth: usize, limit: usize },
    #[error("{0}")]
    Backend(String),
}

/// The capabilities evaluation needs from a network
pub trait Phenotype {
    /// Number of steps needed for a signal to travel the deepest path from an input to an
    /// output. Loops are tolerated, a link closing a loop never adds depth. With `limit > 0`,
    /// a deeper network is reported as [PhenotypeError::DepthExceeded].
    fn max_activation_depth(&self, limit: usize) -> Result<usize, PhenotypeError>;

    /// Bind one input pattern, bias first, to the input nodes
    fn load_sensors(&mut self, inputs: &[f64]) -> Result<(), PhenotypeError>;

    /// Propagate signals `steps` times. Returns whether every output has been reached
    fn forward_steps(&mut self, steps: usize) -> Result<bool, PhenotypeError>;

    /// Reset all node state
    fn flush(&mut self) -> Result<(), PhenotypeError>;

    fn outputs(&self) -> &[f64];
}

/// For some [Genome], a network may construct itself from it.
pub trait FromGenome<G: Genome>: Phenotype {
    fn from_genome(genome: &G, σ: Activation) -> Self;
}

/// The inverse of [FromGenome], implemented automatically by any [Phenotype] for every
/// [Genome] from whom it knows how to construct itself.
pub trait ToNetwork<P: Phenotype>: Genome {
    fn network(&self, σ: Activation) -> P;
}

impl<P: FromGenome<G>, G: Genome> ToNetwork<P> for G {
    fn network(&self, σ: Activation) -> P {
        P::from_genome(self, σ)
    }
}
