use crate::network::PhenotypeError;
use thiserror::Error;

/// Failure to score a generation. Any of these aborts the generation, and the driver treats
/// it as fatal to the whole experiment.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("run options not found in evaluation context")]
    ConfigurationMissing,
    #[error("cannot evaluate an empty population")]
    EmptyPopulation,
    #[error("organism {organism}: failed to estimate activation depth: {source}")]
    Depth {
        organism: usize,
        #[source]
        source: PhenotypeError,
    },
    #[error("organism {organism}: failed to load sensors: {source}")]
    SensorLoad {
        organism: usize,
        #[source]
        source: PhenotypeError,
    },
    #[error("organism {organism}: failed to activate network: {source}")]
    Propagation {
        organism: usize,
        #[source]
        source: PhenotypeError,
    },
    #[error("organism {organism}: failed to flush network: {source}")]
    Flush {
        organism: usize,
        #[source]
        source: PhenotypeError,
    },
}

#[derive(Debug, Error)]
pub enum ReproductionError {
    #[error("too few members to {action} (wanted to produce {wanted} from {have})")]
    TooFewMembers {
        action: &'static str,
        wanted: usize,
        have: usize,
    },
    #[error("no specie left to reproduce")]
    Extinct,
}

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("generation evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("reproduction failed: {0}")]
    Reproduction(#[from] ReproductionError),
}
