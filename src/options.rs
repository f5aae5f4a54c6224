//! Run options for an experiment, read from JSON. Any field left out of the file takes its
//! default from [crate::constants].

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read options from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse options: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid option {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub num_runs: usize,
    pub num_generations: usize,
    pub pop_size: usize,
    /// Limit handed to [crate::network::Phenotype::max_activation_depth], 0 for none
    pub max_activation_depth: usize,

    pub compat_threshold: f64,
    pub survival_threshold: f64,
    pub elitism_min_specie: usize,

    pub mutate_weight_prob: f64,
    pub mutate_connection_prob: f64,
    pub mutate_bisection_prob: f64,
    pub new_weight_prob: f64,
    pub weight_perturb_power: f64,
    pub weight_range: f64,
    pub mutate_only_prob: f64,
    pub keep_disabled_prob: f64,

    pub excess_coefficient: f64,
    pub disjoint_coefficient: f64,
    pub weight_coefficient: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            num_runs: NEATXOR_NUM_RUNS,
            num_generations: NEATXOR_NUM_GENERATIONS,
            pop_size: NEATXOR_POP_SIZE,
            max_activation_depth: NEATXOR_MAX_ACTIVATION_DEPTH,
            compat_threshold: NEATXOR_COMPAT_THRESHOLD,
            survival_threshold: NEATXOR_SURVIVAL_THRESHOLD,
            elitism_min_specie: NEATXOR_ELITISM_MIN_SPECIE,
            mutate_weight_prob: NEATXOR_MUTATE_WEIGHT_PROB,
            mutate_connection_prob: NEATXOR_MUTATE_CONNECTION_PROB,
            mutate_bisection_prob: NEATXOR_MUTATE_BISECTION_PROB,
            new_weight_prob: NEATXOR_NEW_WEIGHT_PROB,
            weight_perturb_power: NEATXOR_WEIGHT_PERTURB_POWER,
            weight_range: NEATXOR_WEIGHT_RANGE,
            mutate_only_prob: NEATXOR_MUTATE_ONLY_PROB,
            keep_disabled_prob: NEATXOR_KEEP_DISABLED_PROB,
            excess_coefficient: NEATXOR_EXCESS_COEFFICIENT,
            disjoint_coefficient: NEATXOR_DISJOINT_COEFFICIENT,
            weight_coefficient: NEATXOR_WEIGHT_COEFFICIENT,
        }
    }
}

impl Options {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, OptionsError> {
        let options: Self = serde_json::from_str(s)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, OptionsError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| OptionsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str(&s)
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        for (field, v) in [
            ("num_runs", self.num_runs),
            ("num_generations", self.num_generations),
            ("pop_size", self.pop_size),
        ] {
            if v == 0 {
                return Err(OptionsError::Invalid {
                    field,
                    reason: "must be greater than 0".into(),
                });
            }
        }

        for (field, p) in [
            ("survival_threshold", self.survival_threshold),
            ("mutate_weight_prob", self.mutate_weight_prob),
            ("mutate_connection_prob", self.mutate_connection_prob),
            ("mutate_bisection_prob", self.mutate_bisection_prob),
            ("new_weight_prob", self.new_weight_prob),
            ("mutate_only_prob", self.mutate_only_prob),
            ("keep_disabled_prob", self.keep_disabled_prob),
        ] {
            if !(0. ..=1.).contains(&p) {
                return Err(OptionsError::Invalid {
                    field,
                    reason: format!("probability {p} is outside [0, 1]"),
                });
            }
        }

        if self.compat_threshold <= 0. {
            return Err(OptionsError::Invalid {
                field: "compat_threshold",
                reason: format!("{} must be positive", self.compat_threshold),
            });
        }

        Ok(())
    }
}
