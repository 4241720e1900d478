//! Wire-dependency graph of a tape.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::{Dfs, EdgeRef, Reversed};
use rustc_hash::FxHashMap;

use crate::measure::ReturnType;
use crate::queue::Queueable;
use crate::tape::Tape;
use crate::wires::{Wire, Wires};

/// Node index type for the circuit graph.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the circuit graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphNode {
    /// An operation, by position in the tape.
    Operation {
        /// Index into [`Tape::operations`].
        index: usize,
        /// Gate name.
        name: String,
    },
    /// A measurement, by position in the tape.
    Measurement {
        /// Index into [`Tape::measurements`].
        index: usize,
        /// Statistic produced.
        return_type: ReturnType,
    },
}

impl GraphNode {
    /// Check if this is an operation node.
    #[inline]
    pub fn is_operation(&self) -> bool {
        matches!(self, GraphNode::Operation { .. })
    }

    /// Check if this is a measurement node.
    #[inline]
    pub fn is_measurement(&self) -> bool {
        matches!(self, GraphNode::Measurement { .. })
    }
}

/// Directed acyclic graph of a tape.
///
/// One node per operation and per measurement; an edge `a → b` labelled
/// with wire `w` means `b` is the next object after `a` acting on `w`.
/// A measurement with no wires (a state measurement) depends on every
/// wire of the tape.
#[derive(Debug)]
pub struct CircuitGraph {
    graph: DiGraph<GraphNode, Wire, u32>,
    operations: Vec<NodeIndex>,
    measurements: Vec<NodeIndex>,
}

impl CircuitGraph {
    /// Build the graph of a tape.
    pub fn from_tape(tape: &Tape) -> Self {
        let mut graph = DiGraph::default();
        // Last node seen on each wire.
        let mut wire_front: FxHashMap<Wire, NodeIndex> = FxHashMap::default();

        let mut attach = |graph: &mut DiGraph<GraphNode, Wire, u32>, node, wires: &Wires| {
            for wire in wires {
                if let Some(&prev) = wire_front.get(wire) {
                    graph.add_edge(prev, node, wire.clone());
                }
                wire_front.insert(wire.clone(), node);
            }
        };

        let mut operations = Vec::with_capacity(tape.operations().len());
        for (index, op) in tape.operations().iter().enumerate() {
            let node = graph.add_node(GraphNode::Operation {
                index,
                name: op.name().to_string(),
            });
            attach(&mut graph, node, op.wires());
            operations.push(node);
        }

        let all_wires = tape.wires();
        let mut measurements = Vec::with_capacity(tape.measurements().len());
        for (index, m) in tape.measurements().iter().enumerate() {
            let node = graph.add_node(GraphNode::Measurement {
                index,
                return_type: m.return_type(),
            });
            let wires = if m.wires().is_empty() { &all_wires } else { m.wires() };
            attach(&mut graph, node, wires);
            measurements.push(node);
        }

        Self {
            graph,
            operations,
            measurements,
        }
    }

    /// Total number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Node of the `i`-th operation.
    pub fn operation_node(&self, i: usize) -> Option<NodeIndex> {
        self.operations.get(i).copied()
    }

    /// Node of the `i`-th measurement.
    pub fn measurement_node(&self, i: usize) -> Option<NodeIndex> {
        self.measurements.get(i).copied()
    }

    /// Measurement nodes, in tape order.
    pub fn observables(&self) -> &[NodeIndex] {
        &self.measurements
    }

    /// Get a node.
    pub fn node(&self, node: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(node)
    }

    /// Layer of each operation node, counted from 1.
    fn op_layers(&self) -> FxHashMap<NodeIndex, usize> {
        let mut layers: FxHashMap<NodeIndex, usize> =
            FxHashMap::with_capacity_and_hasher(self.graph.node_count(), Default::default());

        // Nodes are added in tape order, which is a topological order.
        for node in self.graph.node_indices() {
            let max_pred = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| layers.get(&e.source()).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            let layer = if self.graph[node].is_operation() {
                max_pred + 1
            } else {
                max_pred
            };
            layers.insert(node, layer);
        }
        layers.retain(|n, _| self.graph[*n].is_operation());
        layers
    }

    /// Length of the longest chain of operations sharing wires.
    pub fn depth(&self) -> usize {
        self.op_layers().values().copied().max().unwrap_or(0)
    }

    /// Operation indices grouped by layer; operations in one layer act on
    /// disjoint wires.
    pub fn layers(&self) -> Vec<Vec<usize>> {
        let layers = self.op_layers();
        let mut out: Vec<Vec<usize>> = vec![vec![]; self.depth()];
        for (i, node) in self.operations.iter().enumerate() {
            if let Some(&layer) = layers.get(node) {
                out[layer - 1].push(i);
            }
        }
        out
    }

    /// All nodes that `node` depends on, in ascending index order.
    pub fn ancestors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let reversed = Reversed(&self.graph);
        let mut dfs = Dfs::new(reversed, node);
        let mut out = vec![];
        while let Some(n) = dfs.next(reversed) {
            if n != node {
                out.push(n);
            }
        }
        out.sort_unstable();
        out
    }

    /// The underlying petgraph graph.
    pub fn graph(&self) -> &DiGraph<GraphNode, Wire, u32> {
        &self.graph
    }
}
