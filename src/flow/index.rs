use super::graph::{FlowEdge, FlowGraph, FlowNode};
use crate::error::GraphViolation;
use ahash::AHashMap;

/// Id lookups and adjacency lists over a borrowed [`FlowGraph`].
///
/// Edge lists hold indices into `graph.edges` in creation order. Edges with an
/// unknown endpoint are left out of the adjacency lists and reported by
/// [`GraphIndex::dangling_edges`].
pub struct GraphIndex<'g> {
    graph: &'g FlowGraph,
    nodes: AHashMap<&'g str, usize>,
    outgoing: AHashMap<&'g str, Vec<usize>>,
    incoming: AHashMap<&'g str, Vec<usize>>,
}

impl<'g> GraphIndex<'g> {
    /// Fails on the first duplicate node id.
    pub fn build(graph: &'g FlowGraph) -> Result<Self, GraphViolation> {
        let mut nodes = AHashMap::with_capacity(graph.nodes.len());
        for (i, node) in graph.nodes.iter().enumerate() {
            if nodes.insert(node.id.as_str(), i).is_some() {
                return Err(GraphViolation::DuplicateNode {
                    node_id: node.id.clone(),
                });
            }
        }

        let mut outgoing: AHashMap<&'g str, Vec<usize>> = AHashMap::new();
        let mut incoming: AHashMap<&'g str, Vec<usize>> = AHashMap::new();
        for (i, edge) in graph.edges.iter().enumerate() {
            if nodes.contains_key(edge.source.as_str()) && nodes.contains_key(edge.target.as_str()) {
                outgoing.entry(edge.source.as_str()).or_default().push(i);
                incoming.entry(edge.target.as_str()).or_default().push(i);
            }
        }

        Ok(Self {
            graph,
            nodes,
            outgoing,
            incoming,
        })
    }

    pub fn graph(&self) -> &'g FlowGraph {
        self.graph
    }

    pub fn node(&self, id: &str) -> Option<&'g FlowNode> {
        self.nodes.get(id).map(|&i| &self.graph.nodes[i])
    }

    /// Position of the node in `graph.nodes`.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.nodes.get(id).copied()
    }

    pub fn edge(&self, index: usize) -> &'g FlowEdge {
        &self.graph.edges[index]
    }

    pub fn outgoing_indices(&self, id: &str) -> &[usize] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn outgoing(&self, id: &str) -> impl Iterator<Item = &'g FlowEdge> + '_ {
        self.outgoing_indices(id).iter().map(|&i| self.edge(i))
    }

    pub fn incoming(&self, id: &str) -> impl Iterator<Item = &'g FlowEdge> + '_ {
        self.incoming
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(|&i| self.edge(i))
    }

    pub fn dangling_edges(&self) -> Vec<GraphViolation> {
        let mut violations = Vec::new();
        for edge in &self.graph.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !self.nodes.contains_key(endpoint.as_str()) {
                    violations.push(GraphViolation::DanglingEdge {
                        edge_id: edge.id.clone(),
                        missing_node_id: endpoint.clone(),
                    });
                }
            }
        }
        violations
    }
}
