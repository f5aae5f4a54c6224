use super::{Connection, Genome, NodeKind};
use crate::{crossover::crossover, random::Happens};
use core::{cmp::Ordering, ops::Range};
use rand::{seq::IteratorRandom, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A genome that allows recurrent connections. Nodes are laid out as
/// `[bias, sensory.., action.., internal..]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Recurrent<C: Connection> {
    #[serde(default)]
    id: usize,
    sensory: usize,
    action: usize,
    nodes: Vec<NodeKind>,
    connections: Vec<C>,
}

impl<C: Connection> Genome for Recurrent<C> {
    type Connection = C;

    fn new(sensory: usize, action: usize) -> (Self, usize) {
        let mut nodes = Vec::with_capacity(sensory + action + 1);
        nodes.push(NodeKind::Bias);
        for _ in 0..sensory {
            nodes.push(NodeKind::Sensory);
        }
        for _ in 0..action {
            nodes.push(NodeKind::Action);
        }

        (
            Self {
                id: 0,
                sensory,
                action,
                nodes,
                connections: vec![],
            },
            (sensory + 1) * action,
        )
    }

    #[inline]
    fn id(&self) -> usize {
        self.id
    }

    #[inline]
    fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    #[inline]
    fn inputs(&self) -> Range<usize> {
        0..self.sensory + 1
    }

    #[inline]
    fn action(&self) -> Range<usize> {
        self.sensory + 1..self.sensory + 1 + self.action
    }

    #[inline]
    fn nodes(&self) -> &[NodeKind] {
        &self.nodes
    }

    #[inline]
    fn push_node(&mut self, node: NodeKind) {
        self.nodes.push(node);
    }

    #[inline]
    fn connections(&self) -> &[C] {
        &self.connections
    }

    #[inline]
    fn connections_mut(&mut self) -> &mut [C] {
        &mut self.connections
    }

    #[inline]
    fn push_connection(&mut self, connection: C) {
        self.connections.push(connection);
    }

    fn open_path(&self, rng: &mut impl RngCore) -> Option<(usize, usize)> {
        let mut saturated = HashSet::with_capacity(self.nodes.len());
        loop {
            let (from, _) = self
                .nodes
                .iter()
                .enumerate()
                .filter(|(from, node)| {
                    !matches!(node, NodeKind::Action) && !saturated.contains(from)
                })
                .choose(rng)?;

            let exclude = self
                .connections
                .iter()
                .filter(|c| c.from() == from)
                .map(|c| c.to())
                .collect::<HashSet<_>>();

            if let Some((to, _)) = self
                .nodes
                .iter()
                .enumerate()
                .filter(|(to, node)| {
                    !matches!(node, NodeKind::Bias | NodeKind::Sensory) && !exclude.contains(to)
                })
                .choose(rng)
            {
                break Some((from, to));
            }

            saturated.insert(from);
        }
    }

    fn reproduce_with(&self, other: &Self, self_fit: Ordering, rng: &mut impl Happens) -> Self {
        let connections = crossover(&self.connections, &other.connections, self_fit, rng);
        let parent = if self_fit == Ordering::Less {
            other
        } else {
            self
        };

        debug_assert!(connections
            .iter()
            .all(|c| c.from() < parent.nodes.len() && c.to() < parent.nodes.len()));

        Self {
            id: 0,
            sensory: self.sensory,
            action: self.action,
            nodes: parent.nodes.clone(),
            connections,
        }
    }
}
