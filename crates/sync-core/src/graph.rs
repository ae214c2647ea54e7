//! Dependency graph for ordering entity operations
//!
//! Builds a directed graph of (dependent, dependency) edges over an
//! arbitrary node type and produces a deterministic topological order via
//! Kahn's algorithm: dependencies always come out before the nodes that
//! need them. The graph is a consumed-once working set; sorting takes it
//! by value.

use std::collections::{BinaryHeap, HashMap, HashSet};

/// A directed edge: `dependent` cannot be processed before `dependency`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphEdge<T> {
    pub dependent: T,
    pub dependency: T,
}

impl<T> GraphEdge<T> {
    pub fn new(dependent: T, dependency: T) -> Self {
        Self {
            dependent,
            dependency,
        }
    }
}

/// Error when the edge set contains a cycle; names the nodes that could
/// not be ordered. Callers must treat this as fatal for the affected set,
/// never as a partial order.
#[derive(Debug, Clone)]
pub struct CycleError<T> {
    pub remaining: Vec<T>,
}

impl<T: std::fmt::Debug> std::fmt::Display for CycleError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dependency cycle involving {:?}", self.remaining)
    }
}

impl<T: std::fmt::Debug> std::error::Error for CycleError<T> {}

/// The mutable working set for one topological sort.
#[derive(Debug, Clone)]
pub struct DependencyGraph<T> {
    nodes: Vec<T>,
    edges: Vec<GraphEdge<T>>,
}

impl<T: Eq + std::hash::Hash + Clone> DependencyGraph<T> {
    /// Build a graph over a node set; duplicates are dropped, discovery
    /// order is kept for tie-breaking.
    pub fn new(nodes: impl IntoIterator<Item = T>) -> Self {
        let mut seen = HashSet::new();
        let nodes = nodes
            .into_iter()
            .filter(|n| seen.insert(n.clone()))
            .collect();
        Self {
            nodes,
            edges: Vec::new(),
        }
    }

    /// Add an edge. Edges referring to unknown nodes (external references)
    /// and self-references are ignored — they cannot affect ordering.
    pub fn add_edge(&mut self, dependent: T, dependency: T) {
        if dependent == dependency {
            return;
        }
        if !self.nodes.contains(&dependent) || !self.nodes.contains(&dependency) {
            return;
        }
        let edge = GraphEdge::new(dependent, dependency);
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Topologically sort the nodes, dependencies first.
    ///
    /// Ready nodes (all dependencies consumed) are released lowest
    /// `(priority, discovery index)` first, which makes the output
    /// deterministic for identical inputs. If the queue drains while edges
    /// remain, a cycle exists and the error lists the unordered nodes.
    pub fn sort(self, priority_of: impl Fn(&T) -> i32) -> Result<Vec<T>, CycleError<T>> {
        let index: HashMap<&T, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n, i))
            .collect();

        // Remaining dependency count per node, and reverse adjacency from
        // each dependency to the nodes waiting on it.
        let mut pending = vec![0usize; self.nodes.len()];
        let mut dependents_of: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            let dependent = index[&edge.dependent];
            let dependency = index[&edge.dependency];
            pending[dependent] += 1;
            dependents_of[dependency].push(dependent);
        }

        // Min-heap of ready nodes keyed by (priority, discovery order).
        let mut ready = BinaryHeap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if pending[i] == 0 {
                ready.push(std::cmp::Reverse((priority_of(node), i)));
            }
        }

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(std::cmp::Reverse((_, i))) = ready.pop() {
            order.push(i);
            for &dependent in &dependents_of[i] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.push(std::cmp::Reverse((
                        priority_of(&self.nodes[dependent]),
                        dependent,
                    )));
                }
            }
        }

        if order.len() != self.nodes.len() {
            let placed: HashSet<usize> = order.iter().copied().collect();
            let remaining = self
                .nodes
                .iter()
                .enumerate()
                .filter(|(i, _)| !placed.contains(i))
                .map(|(_, n)| n.clone())
                .collect();
            return Err(CycleError { remaining });
        }

        Ok(order.into_iter().map(|i| self.nodes[i].clone()).collect())
    }
}
