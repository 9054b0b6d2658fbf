//! The visual flow-graph compiler.
//!
//! A [`FlowGraph`] comes straight from the no-code editor. [`FlowCompiler`]
//! checks it against the graph rules (acyclic, every action reachable from
//! exactly one entry, options bound to one entry, ordered condition
//! branches) and against the per-node-type data schemas, then emits a
//! [`FlowSpec`] the host interpreter can run.

pub mod compiler;
pub mod cost;
pub mod graph;
pub mod index;
pub mod schema;

pub use compiler::{CompiledFlow, FlowCompiler, FlowCompilerBuilder, FlowSpec, compile_flow};
pub use cost::{CostFn, CreditEstimate, default_cost};
pub use graph::{
    EdgeKind, FlowEdge, FlowGraph, FlowNode, NodeCategory, NodeType, Position, UnknownNodeType,
};
pub use index::GraphIndex;
pub use schema::{FieldKind, FieldRule, FieldViolation, NodeSchema, check_fields};
