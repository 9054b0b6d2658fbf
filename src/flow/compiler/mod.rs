use crate::error::{GraphValidationError, GraphViolation};
use crate::flow::cost::{CostFn, CreditEstimate, default_cost};
use crate::flow::graph::{FlowEdge, FlowGraph, FlowNode, NodeType};
use crate::flow::index::GraphIndex;
use crate::flow::schema::{NodeSchema, register_default_schemas};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

mod checks;

/// The host-consumable form of a validated graph: the same nodes with their
/// data untouched, and edges ordered so every condition's else branch
/// follows its other branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSpec {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl FlowSpec {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// The result of a successful flow compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledFlow {
    pub spec: FlowSpec,
    pub credits: CreditEstimate,
}

pub struct FlowCompiler {
    graph: FlowGraph,
    schemas: AHashMap<NodeType, Box<dyn NodeSchema>>,
    cost: CostFn,
}

pub struct FlowCompilerBuilder {
    graph: FlowGraph,
    schemas: AHashMap<NodeType, Box<dyn NodeSchema>>,
    cost: CostFn,
}

impl FlowCompilerBuilder {
    pub fn new(graph: FlowGraph) -> Self {
        let mut schemas: AHashMap<NodeType, Box<dyn NodeSchema>> = AHashMap::new();
        register_default_schemas(&mut schemas);
        Self {
            graph,
            schemas,
            cost: default_cost,
        }
    }

    /// Replaces the data schema for the schema's node type.
    pub fn with_schema(mut self, schema: Box<dyn NodeSchema>) -> Self {
        self.schemas.insert(schema.node_type(), schema);
        self
    }

    pub fn with_cost_fn(mut self, cost: CostFn) -> Self {
        self.cost = cost;
        self
    }

    pub fn build(self) -> FlowCompiler {
        FlowCompiler {
            graph: self.graph,
            schemas: self.schemas,
            cost: self.cost,
        }
    }
}

impl FlowCompiler {
    pub fn builder(graph: FlowGraph) -> FlowCompilerBuilder {
        FlowCompilerBuilder::new(graph)
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    /// Validates the graph and emits its specification.
    ///
    /// A duplicate node id stops validation immediately. Every other rule is
    /// checked in full, and all violations come back together in one
    /// [`GraphValidationError`]. Nothing is emitted for an invalid graph.
    pub fn compile(&self) -> Result<CompiledFlow, GraphValidationError> {
        debug!(
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            "compiling flow graph"
        );
        let index = GraphIndex::build(&self.graph)
            .map_err(|violation| GraphValidationError::new(vec![violation]))?;

        let violations: Vec<GraphViolation> = [
            index.dangling_edges(),
            checks::cycles(&index),
            checks::reachability(&index),
            checks::option_bindings(&index),
            checks::conditions(&index),
            checks::node_data(&index, &self.schemas),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !violations.is_empty() {
            info!(violations = violations.len(), "flow graph rejected");
            return Err(GraphValidationError::new(violations));
        }

        let spec = FlowSpec {
            nodes: self.graph.nodes.clone(),
            edges: order_edges(&index),
        };
        let credits = CreditEstimate::compute(&spec.nodes, self.cost);
        info!(
            nodes = spec.nodes.len(),
            edges = spec.edges.len(),
            credits = credits.total,
            "flow graph compiled"
        );
        Ok(CompiledFlow { spec, credits })
    }
}

/// Compiles a graph with the default schemas and credit table.
pub fn compile_flow(graph: FlowGraph) -> Result<CompiledFlow, GraphValidationError> {
    FlowCompiler::builder(graph).build().compile()
}

/// Keeps edges in creation order except that, within the slots held by one
/// condition's outgoing edges, else branches move behind the others.
fn order_edges(index: &GraphIndex<'_>) -> Vec<FlowEdge> {
    let graph = index.graph();
    let mut order: Vec<usize> = (0..graph.edges.len()).collect();

    for node in graph.nodes.iter().filter(|n| n.node_type.is_condition()) {
        let slots = index.outgoing_indices(&node.id);
        let is_else = |&i: &usize| {
            index
                .node(&index.edge(i).target)
                .is_some_and(|t| t.node_type == NodeType::ConditionItemElse)
        };
        let (mut branches, else_branches): (Vec<usize>, Vec<usize>) =
            slots.iter().copied().partition(|i| !is_else(i));
        branches.extend(else_branches);
        for (&slot, edge_index) in slots.iter().zip(branches) {
            order[slot] = edge_index;
        }
    }

    order.into_iter().map(|i| graph.edges[i].clone()).collect()
}
