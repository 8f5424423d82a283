/*!
 * Resource Allocation Graph
 *
 * Directed bipartite graph with one node per process and per resource:
 * - allocation edges `R -> P` for every holder of a resource
 * - request edges `P -> R` for every pending request
 *
 * Adjacency is kept in ordered maps so cycle search visits nodes and edges
 * in id order and always reports the same cycle for the same state.
 */

use crate::core::types::{Pid, Rid};
use crate::process::System;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RagNode {
    Process(Pid),
    Resource(Rid),
}

impl RagNode {
    pub fn as_process(&self) -> Option<Pid> {
        match self {
            RagNode::Process(pid) => Some(*pid),
            RagNode::Resource(_) => None,
        }
    }
}

impl fmt::Display for RagNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RagNode::Process(pid) => write!(f, "P{}", pid),
            RagNode::Resource(rid) => write!(f, "R{}", rid),
        }
    }
}

/// Edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Resource held by process
    Allocation,
    /// Process waiting for resource
    Request,
}

/// A directed edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RagEdge {
    pub from: RagNode,
    pub to: RagNode,
    pub kind: EdgeKind,
}

impl fmt::Display for RagEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not visited yet
    White,
    /// On the current DFS path
    Gray,
    /// Fully explored
    Black,
}

/// Resource allocation graph built from a system at one point in time
#[derive(Debug, Clone, Default)]
pub struct ResourceAllocationGraph {
    adjacency: BTreeMap<RagNode, Vec<RagEdge>>,
}

impl ResourceAllocationGraph {
    /// Build the graph for the current allocation state
    pub fn from_system(system: &System) -> Self {
        let mut adjacency: BTreeMap<RagNode, Vec<RagEdge>> = BTreeMap::new();

        for process in system.processes() {
            let node = RagNode::Process(process.pid());
            let edges = process
                .resources_requested()
                .map(|rid| RagEdge {
                    from: node,
                    to: RagNode::Resource(rid),
                    kind: EdgeKind::Request,
                })
                .collect();
            adjacency.insert(node, edges);
        }

        for resource in system.resources() {
            let node = RagNode::Resource(resource.rid());
            let edges = resource
                .holders()
                .map(|pid| RagEdge {
                    from: node,
                    to: RagNode::Process(pid),
                    kind: EdgeKind::Allocation,
                })
                .collect();
            adjacency.insert(node, edges);
        }

        Self { adjacency }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn nodes(&self) -> impl Iterator<Item = RagNode> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = &RagEdge> {
        self.adjacency.values().flatten()
    }

    pub fn successors(&self, node: RagNode) -> &[RagEdge] {
        self.adjacency
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Find one cycle, returned as its edges in traversal order
    ///
    /// Iterative depth-first search with white/gray/black coloring; an edge
    /// into a gray node closes a cycle along the current path.
    pub fn find_cycle(&self) -> Option<Vec<RagEdge>> {
        let mut color: BTreeMap<RagNode, Color> =
            self.adjacency.keys().map(|&n| (n, Color::White)).collect();

        for &root in self.adjacency.keys() {
            if color.get(&root) != Some(&Color::White) {
                continue;
            }

            // (node, index of next edge to explore)
            let mut stack: Vec<(RagNode, usize)> = vec![(root, 0)];
            // path[i] is the edge from stack[i] to stack[i + 1]
            let mut path: Vec<RagEdge> = Vec::new();
            color.insert(root, Color::Gray);

            while let Some(top) = stack.last_mut() {
                let (node, next) = *top;
                let edges = self.successors(node);

                if next < edges.len() {
                    top.1 += 1;
                    let edge = edges[next];
                    match color.get(&edge.to).copied().unwrap_or(Color::White) {
                        Color::White => {
                            color.insert(edge.to, Color::Gray);
                            stack.push((edge.to, 0));
                            path.push(edge);
                        }
                        Color::Gray => {
                            if let Some(start) = stack.iter().position(|(n, _)| *n == edge.to) {
                                let mut cycle = path[start..].to_vec();
                                cycle.push(edge);
                                return Some(cycle);
                            }
                        }
                        Color::Black => {}
                    }
                } else {
                    color.insert(node, Color::Black);
                    stack.pop();
                    path.pop();
                }
            }
        }

        None
    }
}
