pub mod connection;
pub mod recurrent;

pub use connection::WConnection;
pub use recurrent::Recurrent;

use crate::{
    options::Options,
    random::{EvolutionEvent, Happens},
};
use core::{
    cmp::{max, Ordering},
    error::Error,
    fmt::Debug,
    hash::Hash,
    ops::Range,
};
use fxhash::FxHashMap;
use rand::{seq::IteratorRandom, Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Bias,
    Sensory,
    Action,
    Internal,
}

/// Why a genome read from outside cannot be expressed as a network
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenomeError {
    #[error("genome has {nodes} nodes, its inputs and outputs need {needed}")]
    TooFewNodes { nodes: usize, needed: usize },
    #[error("node {index} is {found:?}, expected {expected:?}")]
    Misplaced {
        index: usize,
        expected: NodeKind,
        found: NodeKind,
    },
    #[error("connection {from} -> {to} leaves the genome's {nodes} nodes")]
    Dangling { from: usize, to: usize, nodes: usize },
}

/// Hands out innovation ids, one per distinct `(from, to)` path
#[derive(Debug, Clone, Default)]
pub struct InnoGen {
    pub head: usize,
    seen: FxHashMap<(usize, usize), usize>,
}

impl InnoGen {
    pub fn new(head: usize) -> Self {
        Self {
            head,
            seen: FxHashMap::default(),
        }
    }

    pub fn path(&mut self, v: (usize, usize)) -> usize {
        match self.seen.get(&v) {
            Some(n) => *n,
            None => {
                let n = self.head;
                self.head += 1;
                self.seen.insert(v, n);
                n
            }
        }
    }
}

/// How weights are nudged or replaced during mutation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightMutation {
    pub power: f64,
    pub range: f64,
}

impl Default for WeightMutation {
    fn default() -> Self {
        Self::from(&Options::default())
    }
}

impl From<&Options> for WeightMutation {
    fn from(options: &Options) -> Self {
        Self {
            power: options.weight_perturb_power,
            range: options.weight_range,
        }
    }
}

impl WeightMutation {
    pub fn fresh(&self, rng: &mut impl RngCore) -> f64 {
        if self.range <= 0. {
            0.
        } else {
            rng.random_range(-self.range..=self.range)
        }
    }
}

pub trait Connection:
    Serialize + for<'de> Deserialize<'de> + Clone + Hash + PartialEq + Default + Debug + Send + Sync
{
    fn new(from: usize, to: usize, inno: &mut InnoGen) -> Self;

    /// gene innovation id
    fn inno(&self) -> usize;

    fn path(&self) -> (usize, usize);

    fn from(&self) -> usize {
        self.path().0
    }

    fn to(&self) -> usize {
        self.path().1
    }

    fn weight(&self) -> f64;

    fn set_weight(&mut self, weight: f64);

    /// whether or not this connection is active, and therefore affects its genomes behavior
    fn enabled(&self) -> bool;

    fn enable(&mut self);

    fn disable(&mut self);

    /// difference of connection parameters between this and another connection with the same
    /// innovation id
    fn param_diff(&self, other: &Self) -> f64 {
        (self.weight() - other.weight()).abs()
    }

    /// Either replace the weight outright, or perturb it by a normal sample scaled by power
    fn mutate_param(&mut self, rng: &mut impl Happens, how: WeightMutation) {
        if rng.happens(EvolutionEvent::NewWeight) {
            self.set_weight(how.fresh(rng));
        } else {
            let n: f64 = rng.sample(rand_distr::StandardNormal);
            self.set_weight(self.weight() + n * how.power);
        }
    }

    /// Disable this connection and return the two connections that route through `center`
    fn bisect(&mut self, center: usize, inno: &mut InnoGen) -> (Self, Self);
}

pub trait Genome: Serialize + for<'de> Deserialize<'de> + Clone + Debug + Send + Sync {
    type Connection: Connection;

    /// A new genome of this type, with a known input and output size. Returns the genome
    /// alongside the next free innovation id
    fn new(sensory: usize, action: usize) -> (Self, usize);

    /// A new genome whose every input, bias included, connects to every output
    fn fully_connected(sensory: usize, action: usize) -> (Self, InnoGen) {
        let (mut genome, head) = Self::new(sensory, action);
        let mut inno = InnoGen::new(head);
        for to in genome.action() {
            for from in genome.inputs() {
                genome.push_connection(Self::Connection::new(from, to, &mut inno));
            }
        }
        (genome, inno)
    }

    /// Identifier of this genome within its population
    fn id(&self) -> usize;

    fn set_id(&mut self, id: usize);

    /// Range of nodes fed by [crate::network::Phenotype::load_sensors], the bias node first
    fn inputs(&self) -> Range<usize>;

    fn action(&self) -> Range<usize>;

    fn nodes(&self) -> &[NodeKind];

    fn push_node(&mut self, node: NodeKind);

    fn connections(&self) -> &[Self::Connection];

    fn connections_mut(&mut self) -> &mut [Self::Connection];

    fn push_connection(&mut self, connection: Self::Connection);

    /// Count of expressed genes, those connections that are enabled
    fn extrons(&self) -> usize {
        self.connections().iter().filter(|c| c.enabled()).count()
    }

    /// Nodes plus expressed genes
    fn complexity(&self) -> usize {
        self.nodes().len() + self.extrons()
    }

    /// Check that the nodes are laid out as inputs and outputs say they are, and that every
    /// connection joins two existing nodes
    fn validate(&self) -> Result<(), GenomeError> {
        let nodes = self.nodes();
        let (inputs, action) = (self.inputs(), self.action());
        let needed = max(inputs.end, action.end);
        if nodes.len() < needed {
            return Err(GenomeError::TooFewNodes {
                nodes: nodes.len(),
                needed,
            });
        }

        for (index, &found) in nodes.iter().enumerate() {
            let expected = if index == inputs.start {
                NodeKind::Bias
            } else if inputs.contains(&index) {
                NodeKind::Sensory
            } else if action.contains(&index) {
                NodeKind::Action
            } else {
                NodeKind::Internal
            };
            if found != expected {
                return Err(GenomeError::Misplaced {
                    index,
                    expected,
                    found,
                });
            }
        }

        match self
            .connections()
            .iter()
            .map(|c| c.path())
            .find(|&(from, to)| from >= nodes.len() || to >= nodes.len())
        {
            Some((from, to)) => Err(GenomeError::Dangling {
                from,
                to,
                nodes: nodes.len(),
            }),
            None => Ok(()),
        }
    }

    /// A random `(from, to)` pair not yet connected, if any remain
    fn open_path(&self, rng: &mut impl RngCore) -> Option<(usize, usize)>;

    /// Connect a random open path. Returns false when the genome is saturated
    fn new_connection(
        &mut self,
        rng: &mut impl RngCore,
        inno: &mut InnoGen,
        how: WeightMutation,
    ) -> bool {
        match self.open_path(rng) {
            Some((from, to)) => {
                let mut connection = Self::Connection::new(from, to, inno);
                connection.set_weight(how.fresh(rng));
                self.push_connection(connection);
                true
            }
            None => false,
        }
    }

    /// Split a random enabled connection with a new internal node. Returns false when there
    /// is nothing to split
    fn bisect_connection(&mut self, rng: &mut impl RngCore, inno: &mut InnoGen) -> bool {
        let Some(idx) = self
            .connections()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.enabled())
            .map(|(idx, _)| idx)
            .choose(rng)
        else {
            return false;
        };

        let center = self.nodes().len();
        self.push_node(NodeKind::Internal);
        let (l, r) = self.connections_mut()[idx].bisect(center, inno);
        self.push_connection(l);
        self.push_connection(r);
        true
    }

    fn mutate_params(&mut self, rng: &mut impl Happens, how: WeightMutation) {
        for connection in self.connections_mut() {
            connection.mutate_param(rng, how);
        }
    }

    /// Perform 0 or more mutations on this genome
    fn mutate(&mut self, rng: &mut impl Happens, inno: &mut InnoGen, how: WeightMutation) {
        if rng.happens(EvolutionEvent::MutateWeight) {
            self.mutate_params(rng, how);
        }
        if rng.happens(EvolutionEvent::MutateConnection) {
            self.new_connection(rng, inno, how);
        }
        if rng.happens(EvolutionEvent::MutateBisection) {
            self.bisect_connection(rng, inno);
        }
    }

    /// Perform crossover reproduction with other, where our fitness is `fitness_cmp` compared
    /// to other
    fn reproduce_with(&self, other: &Self, fitness_cmp: Ordering, rng: &mut impl Happens)
        -> Self;

    fn to_string(&self) -> Result<String, Box<dyn Error>> {
        Ok(serde_json::to_string(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    fn from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let genome: Self = serde_json::from_str(s)?;
        genome.validate()?;
        Ok(genome)
    }

    fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}
