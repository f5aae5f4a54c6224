#![allow(mixed_script_confusables)]
#![allow(confusable_idents)]

pub mod constants;
pub mod context;
pub mod crossover;
pub mod error;
pub mod experiment;
pub mod genome;
pub mod logging;
pub mod macros;
pub mod network;
pub mod options;
pub mod population;
pub mod random;
pub mod reproduce;
pub mod runner;
pub mod serialize;
pub mod specie;
pub mod xor;

pub use context::{CancelHandle, Context};
pub use error::{EvaluationError, ExperimentError, ReproductionError};
pub use experiment::{Experiment, Generation, GenerationEvaluator, Summary, Trial};
pub use genome::{Connection, Genome, GenomeError, Recurrent, WConnection};
pub use network::{activate, Activation, Phenotype, PhenotypeError, Synchronous};
pub use options::{Options, OptionsError};
pub use population::{Organism, Population};
pub use random::{Happens, Probabilities};
pub use runner::{Outcome, WaitError};
pub use specie::Specie;
pub use xor::XorGenerationEvaluator;
