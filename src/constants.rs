//! Centralized defaults for neatxor runs.
//!
//! Every run parameter has a `NEATXOR_` prefixed default here, and [crate::options::Options]
//! falls back to these whenever an options file leaves a field out.

// ============================================================================
// Experiment Parameters
// ============================================================================

/// Number of independent trials in one experiment
pub const NEATXOR_NUM_RUNS: usize = 100;

/// Maximum generations per trial before it is declared unsolved
pub const NEATXOR_NUM_GENERATIONS: usize = 100;

/// Organisms per generation
pub const NEATXOR_POP_SIZE: usize = 150;

/// Upper bound handed to the phenotype when estimating activation depth, 0 for none
pub const NEATXOR_MAX_ACTIVATION_DEPTH: usize = 0;

// ============================================================================
// Scoring
// ============================================================================

/// Fitness above which an XOR organism counts as a winner
pub const NEATXOR_XOR_FITNESS_THRESHOLD: f64 = 15.5;

/// Best achievable XOR fitness, (4 - 0)^2
pub const NEATXOR_XOR_MAX_FITNESS: f64 = 16.0;

// ============================================================================
// Population Parameters
// ============================================================================

/// Genetic distance threshold for speciation
pub const NEATXOR_COMPAT_THRESHOLD: f64 = 3.0;

/// Fraction of each specie, best first, allowed to reproduce
pub const NEATXOR_SURVIVAL_THRESHOLD: f64 = 0.2;

/// Species at least this big keep their champion unchanged
pub const NEATXOR_ELITISM_MIN_SPECIE: usize = 5;

// ============================================================================
// Mutation Parameters
// ============================================================================

/// Probability of mutating every weight of a child
pub const NEATXOR_MUTATE_WEIGHT_PROB: f64 = 0.8;

/// Probability of adding a new connection to a child
pub const NEATXOR_MUTATE_CONNECTION_PROB: f64 = 0.05;

/// Probability of bisecting a connection (adding a node)
pub const NEATXOR_MUTATE_BISECTION_PROB: f64 = 0.03;

/// Probability of replacing a weight vs perturbing it
pub const NEATXOR_NEW_WEIGHT_PROB: f64 = 0.1;

/// Scale of the normal perturbation applied to weights
pub const NEATXOR_WEIGHT_PERTURB_POWER: f64 = 2.5;

/// Range a replaced weight is drawn from, symmetric around 0
pub const NEATXOR_WEIGHT_RANGE: f64 = 3.0;

/// Probability that an offspring is a mutated copy rather than a crossover child
pub const NEATXOR_MUTATE_ONLY_PROB: f64 = 0.25;

/// Probability of keeping a gene disabled when either parent had it disabled
pub const NEATXOR_KEEP_DISABLED_PROB: f64 = 0.75;

// ============================================================================
// Crossover Coefficients
// ============================================================================

/// Coefficient for excess genes in compatibility distance calculation
pub const NEATXOR_EXCESS_COEFFICIENT: f64 = 1.0;

/// Coefficient for disjoint genes in compatibility distance calculation
pub const NEATXOR_DISJOINT_COEFFICIENT: f64 = 1.0;

/// Coefficient for weight differences in compatibility distance calculation
pub const NEATXOR_WEIGHT_COEFFICIENT: f64 = 0.4;

/// Genome size threshold for normalization in delta calculation
pub const NEATXOR_NORMALIZATION_THRESHOLD: usize = 20;
