//! The collect-all validation passes. Each pass returns every violation it
//! finds, in node order, and never stops at the first one.

use crate::error::GraphViolation;
use crate::flow::graph::{EdgeKind, NodeType};
use crate::flow::index::GraphIndex;
use crate::flow::schema::NodeSchema;
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    OnStack,
    Done,
}

/// Reports every edge that closes a cycle. Traversal starts at the entry
/// nodes and then at every node not yet visited, so detached cycles are found
/// too.
pub(super) fn cycles(index: &GraphIndex<'_>) -> Vec<GraphViolation> {
    let graph = index.graph();
    let roots = graph
        .nodes
        .iter()
        .filter(|n| n.node_type.is_entry())
        .chain(graph.nodes.iter().filter(|n| !n.node_type.is_entry()));

    let mut state: AHashMap<&str, Visit> = AHashMap::with_capacity(graph.nodes.len());
    let mut violations = Vec::new();

    for root in roots {
        if state.contains_key(root.id.as_str()) {
            continue;
        }
        // (node id, position in its outgoing edge list)
        let mut stack: Vec<(&str, usize)> = vec![(root.id.as_str(), 0)];
        state.insert(root.id.as_str(), Visit::OnStack);

        while let Some(top) = stack.last_mut() {
            let (node_id, cursor) = *top;
            top.1 += 1;
            let Some(&edge_index) = index.outgoing_indices(node_id).get(cursor) else {
                state.insert(node_id, Visit::Done);
                stack.pop();
                continue;
            };

            let edge = index.edge(edge_index);
            match state.get(edge.target.as_str()) {
                Some(Visit::OnStack) => violations.push(GraphViolation::CyclicGraph {
                    edge_id: edge.id.clone(),
                    source_node_id: edge.source.clone(),
                    target_node_id: edge.target.clone(),
                }),
                Some(Visit::Done) => {}
                None => {
                    state.insert(edge.target.as_str(), Visit::OnStack);
                    stack.push((edge.target.as_str(), 0));
                }
            }
        }
    }
    violations
}

/// Every non-entry, non-option node must be reachable from exactly one entry.
pub(super) fn reachability(index: &GraphIndex<'_>) -> Vec<GraphViolation> {
    let graph = index.graph();
    let mut reached_by: AHashMap<&str, Vec<&str>> = AHashMap::new();

    for entry in graph.nodes.iter().filter(|n| n.node_type.is_entry()) {
        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([entry.id.as_str()]);
        seen.insert(entry.id.as_str());
        while let Some(node_id) = queue.pop_front() {
            for edge in index.outgoing(node_id) {
                if seen.insert(edge.target.as_str()) {
                    reached_by
                        .entry(edge.target.as_str())
                        .or_default()
                        .push(entry.id.as_str());
                    queue.push_back(edge.target.as_str());
                }
            }
        }
    }

    let mut violations = Vec::new();
    for node in &graph.nodes {
        if node.node_type.is_entry() || node.node_type.is_option() {
            continue;
        }
        match reached_by.get(node.id.as_str()).map(Vec::as_slice) {
            None | Some([]) => violations.push(GraphViolation::UnreachableNode {
                node_id: node.id.clone(),
            }),
            Some([_]) => {}
            Some(entries) => violations.push(GraphViolation::SharedNode {
                node_id: node.id.clone(),
                entry_ids: entries.iter().map(|id| id.to_string()).collect(),
            }),
        }
    }
    violations
}

/// Every option needs exactly one outgoing fixed edge, to an entry of the
/// matching kind.
pub(super) fn option_bindings(index: &GraphIndex<'_>) -> Vec<GraphViolation> {
    let mut violations = Vec::new();
    for node in index.graph().nodes.iter().filter(|n| n.node_type.is_option()) {
        let fixed: Vec<_> = index
            .outgoing(&node.id)
            .filter(|e| e.kind == EdgeKind::Fixed)
            .collect();

        let reason = match fixed.as_slice() {
            [] => Some("no fixed edge to an entry node".to_string()),
            [edge] => match index.node(&edge.target).map(|t| t.node_type) {
                Some(target) if !target.is_entry() => Some(format!(
                    "fixed edge '{}' targets '{}' which is a {}, not an entry node",
                    edge.id, edge.target, target
                )),
                Some(target) if node.node_type.bound_entry() != Some(target) => Some(format!(
                    "{} cannot be bound to {} '{}'",
                    node.node_type, target, edge.target
                )),
                _ => None,
            },
            edges => Some(format!(
                "{} fixed edges, exactly one entry binding is allowed",
                edges.len()
            )),
        };

        if let Some(reason) = reason {
            violations.push(GraphViolation::InvalidOptionBinding {
                node_id: node.id.clone(),
                reason,
            });
        }
    }
    violations
}

/// Condition nodes branch only into condition items, with at most one else
/// branch; condition items hang only off condition nodes.
pub(super) fn conditions(index: &GraphIndex<'_>) -> Vec<GraphViolation> {
    let mut violations = Vec::new();
    for node in &index.graph().nodes {
        if node.node_type.is_condition() {
            let mut else_count = 0;
            for edge in index.outgoing(&node.id) {
                let Some(child) = index.node(&edge.target) else {
                    continue;
                };
                match child.node_type {
                    NodeType::ConditionItemElse => else_count += 1,
                    NodeType::ConditionItemCompare => {}
                    other => violations.push(GraphViolation::InvalidConditionChild {
                        node_id: child.id.clone(),
                        parent_id: node.id.clone(),
                        reason: format!("{} is not a condition item", other),
                    }),
                }
            }
            if else_count > 1 {
                violations.push(GraphViolation::MultipleElseBranches {
                    node_id: node.id.clone(),
                    count: else_count,
                });
            }
        } else if node.node_type.is_condition_item() {
            for edge in index.incoming(&node.id) {
                let Some(parent) = index.node(&edge.source) else {
                    continue;
                };
                if !parent.node_type.is_condition() {
                    violations.push(GraphViolation::InvalidConditionChild {
                        node_id: node.id.clone(),
                        parent_id: parent.id.clone(),
                        reason: format!("parent {} is not a condition node", parent.node_type),
                    });
                }
            }
        }
    }
    violations
}

/// Runs each node's schema over its `data`, qualifying every field with the
/// node's position, e.g. `nodes[3].data.channel_id`.
pub(super) fn node_data(
    index: &GraphIndex<'_>,
    schemas: &AHashMap<NodeType, Box<dyn NodeSchema>>,
) -> Vec<GraphViolation> {
    let mut violations = Vec::new();
    for (i, node) in index.graph().nodes.iter().enumerate() {
        let Some(schema) = schemas.get(&node.node_type) else {
            continue;
        };
        for field in schema.validate(&node.data) {
            let path = if field.field.is_empty() {
                format!("nodes[{}].data", i)
            } else {
                format!("nodes[{}].data.{}", i, field.field)
            };
            violations.push(GraphViolation::InvalidData {
                node_id: node.id.clone(),
                path,
                message: field.message,
            });
        }
    }
    violations
}
