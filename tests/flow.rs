//! Tests for flow graph validation and specification output.
mod common;
use common::*;
use kestrel::error::GraphViolation;
use kestrel::flow::{
    EdgeKind, FieldRule, FieldViolation, FlowCompiler, FlowGraph, FlowNode, NodeSchema, NodeType,
    check_fields, compile_flow,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn violations(graph: FlowGraph) -> Vec<GraphViolation> {
    compile_flow(graph)
        .expect_err("graph should be rejected")
        .violations
}

#[test]
fn test_command_with_bound_option_compiles() {
    let compiled = compile_flow(command_graph()).expect("Failed to compile");
    assert_eq!(compiled.spec.nodes.len(), 3);
    assert_eq!(compiled.spec.edges.len(), 2);
    assert_eq!(compiled.spec.nodes, command_graph().nodes);
    assert_eq!(compiled.credits.total, 1);
}

#[test]
fn test_removing_the_option_binding_is_rejected() {
    let mut graph = command_graph();
    graph.edges.retain(|e| e.id != "e2-1");

    let found = violations(graph);
    assert_eq!(found.len(), 1);
    match &found[0] {
        GraphViolation::InvalidOptionBinding { node_id, .. } => assert_eq!(node_id, "2"),
        other => panic!("expected InvalidOptionBinding, got {other:?}"),
    }
}

#[test]
fn test_option_with_two_fixed_edges_is_rejected() {
    let mut graph = command_graph();
    graph.nodes.push(command_entry("9"));
    graph.edges.push(fixed("e2-9", "2", "9"));

    let found = violations(graph);
    assert!(found.iter().any(|v| matches!(
        v,
        GraphViolation::InvalidOptionBinding { node_id, reason } if node_id == "2" && reason.contains("2 fixed edges")
    )));
}

#[test]
fn test_option_bound_through_removable_edge_is_rejected() {
    let mut graph = command_graph();
    graph.edges[0].kind = EdgeKind::Removable;

    let found = violations(graph);
    assert_eq!(found[0].node_id(), Some("2"));
}

#[test]
fn test_command_option_bound_to_event_entry_is_rejected() {
    let graph = FlowGraph {
        nodes: vec![event_entry("1"), text_option("2"), log("3")],
        edges: vec![fixed("e2-1", "2", "1"), removable("e1-3", "1", "3")],
    };
    let found = violations(graph);
    assert_eq!(
        found,
        vec![GraphViolation::InvalidOptionBinding {
            node_id: "2".to_string(),
            reason: "OPTION_COMMAND_TEXT cannot be bound to ENTRY_EVENT '1'".to_string(),
        }]
    );
}

#[test]
fn test_cycle_is_rejected_naming_the_closing_edge() {
    let graph = FlowGraph {
        nodes: vec![command_entry("1"), log("2"), log("3")],
        edges: vec![
            removable("a", "1", "2"),
            removable("b", "2", "3"),
            removable("c", "3", "2"),
        ],
    };
    let found = violations(graph);
    assert_eq!(
        found,
        vec![GraphViolation::CyclicGraph {
            edge_id: "c".to_string(),
            source_node_id: "3".to_string(),
            target_node_id: "2".to_string(),
        }]
    );
}

#[test]
fn test_detached_cycle_is_reported_too() {
    let mut graph = command_graph();
    graph.nodes.push(log("8"));
    graph.nodes.push(log("9"));
    graph.edges.push(removable("x", "8", "9"));
    graph.edges.push(removable("y", "9", "8"));

    let found = violations(graph);
    assert!(found
        .iter()
        .any(|v| matches!(v, GraphViolation::CyclicGraph { edge_id, .. } if edge_id == "y")));
    let unreachable: Vec<_> = found
        .iter()
        .filter(|v| matches!(v, GraphViolation::UnreachableNode { .. }))
        .filter_map(GraphViolation::node_id)
        .collect();
    assert_eq!(unreachable, vec!["8", "9"]);
}

#[test]
fn test_every_unreachable_node_is_reported_in_one_pass() {
    let mut graph = command_graph();
    graph.nodes.push(log("4"));
    graph.nodes.push(respond("5"));
    graph.nodes.push(log("6"));

    let found = violations(graph);
    assert_eq!(
        found,
        vec![
            GraphViolation::UnreachableNode { node_id: "4".to_string() },
            GraphViolation::UnreachableNode { node_id: "5".to_string() },
            GraphViolation::UnreachableNode { node_id: "6".to_string() },
        ]
    );
}

#[test]
fn test_node_shared_by_two_entries_is_rejected() {
    let graph = FlowGraph {
        nodes: vec![command_entry("1"), event_entry("2"), log("3")],
        edges: vec![removable("a", "1", "3"), removable("b", "2", "3")],
    };
    let found = violations(graph);
    assert_eq!(
        found,
        vec![GraphViolation::SharedNode {
            node_id: "3".to_string(),
            entry_ids: vec!["1".to_string(), "2".to_string()],
        }]
    );
}

#[test]
fn test_duplicate_node_id_fails_fast() {
    let mut graph = command_graph();
    graph.nodes.push(log("3"));
    graph.nodes.push(log("orphan"));

    let found = violations(graph);
    assert_eq!(
        found,
        vec![GraphViolation::DuplicateNode { node_id: "3".to_string() }]
    );
}

#[test]
fn test_dangling_edge_is_reported() {
    let mut graph = command_graph();
    graph.edges.push(removable("ghost", "3", "404"));

    let found = violations(graph);
    assert_eq!(
        found,
        vec![GraphViolation::DanglingEdge {
            edge_id: "ghost".to_string(),
            missing_node_id: "404".to_string(),
        }]
    );
}

#[test]
fn test_else_branch_is_ordered_last() {
    let compiled = compile_flow(condition_graph()).expect("Failed to compile");
    let order: Vec<&str> = compiled.spec.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(order, vec!["e1-2", "e2-4", "e2-5", "e2-3", "e3-6", "e4-7"]);
    // Compare branches keep creation order.
    assert_eq!(compiled.spec.nodes, condition_graph().nodes);
}

#[test]
fn test_second_else_branch_is_rejected() {
    let mut graph = condition_graph();
    graph.nodes.push(FlowNode::new("8", NodeType::ConditionItemElse, json!({})));
    graph.edges.push(fixed("e2-8", "2", "8"));

    let found = violations(graph);
    assert_eq!(
        found,
        vec![GraphViolation::MultipleElseBranches {
            node_id: "2".to_string(),
            count: 2,
        }]
    );
}

#[test]
fn test_condition_children_must_be_items() {
    let mut graph = condition_graph();
    graph.nodes.push(log("8"));
    graph.edges.push(removable("e2-8", "2", "8"));
    graph.edges.push(removable("e7-5", "7", "5"));

    let found = violations(graph);
    assert!(found.contains(&GraphViolation::InvalidConditionChild {
        node_id: "8".to_string(),
        parent_id: "2".to_string(),
        reason: "ACTION_LOG is not a condition item".to_string(),
    }));
    assert!(found.contains(&GraphViolation::InvalidConditionChild {
        node_id: "5".to_string(),
        parent_id: "7".to_string(),
        reason: "parent ACTION_RESPONSE_CREATE is not a condition node".to_string(),
    }));
}

#[test]
fn test_data_violations_are_path_qualified() {
    let mut graph = command_graph();
    graph.nodes.push(node(
        "4",
        NodeType::ActionMessageCreate,
        json!({ "message_data": { "content": "hi" } }),
    ));
    graph.edges.push(removable("e3-4", "3", "4"));

    let error = compile_flow(graph).expect_err("missing channel_id");
    assert_eq!(error.len(), 1);
    assert_eq!(error.violations[0].to_string(), "nodes[3].data.channel_id: required");
    assert_eq!(error.offending_nodes(), vec!["4"]);
}

#[test]
fn test_violations_of_different_kinds_are_collected_together() {
    let mut graph = command_graph();
    graph.edges.retain(|e| e.id != "e2-1");
    graph.nodes.push(node("4", NodeType::ActionMemberBan, json!({})));
    graph.nodes[0].data = json!({ "name": "greet" });

    let error = compile_flow(graph).expect_err("several violations");
    let rendered: Vec<String> = error.violations.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "Node '4' is not reachable from any entry node".to_string(),
            "Option node '2' has an invalid binding: no fixed edge to an entry node".to_string(),
            "nodes[0].data.description: required".to_string(),
            "nodes[3].data.user_id: required".to_string(),
        ]
    );
}

struct StrictLogSchema;

impl NodeSchema for StrictLogSchema {
    fn node_type(&self) -> NodeType {
        NodeType::ActionLog
    }

    fn validate(&self, data: &serde_json::Value) -> Vec<FieldViolation> {
        let mut found = check_fields(
            data,
            &[FieldRule {
                name: "message",
                kind: kestrel::flow::FieldKind::Text,
                required: true,
            }],
        );
        if data.get("level").is_none() {
            found.push(FieldViolation::new("level", "required by this deployment"));
        }
        found
    }
}

#[test]
fn test_custom_schema_replaces_the_default() {
    let graph = FlowGraph {
        nodes: vec![command_entry("1"), log("2")],
        edges: vec![removable("a", "1", "2")],
    };
    assert!(compile_flow(graph.clone()).is_ok());

    let error = FlowCompiler::builder(graph)
        .with_schema(Box::new(StrictLogSchema))
        .build()
        .compile()
        .expect_err("custom schema requires a level");
    assert_eq!(
        error.violations[0].to_string(),
        "nodes[1].data.level: required by this deployment"
    );
}

#[test]
fn test_custom_cost_fn_is_summed_over_all_nodes() {
    let compiled = FlowCompiler::builder(condition_graph())
        .with_cost_fn(|_| 2)
        .build()
        .compile()
        .expect("Failed to compile");
    assert_eq!(compiled.credits.total, 14);
    assert_eq!(compiled.credits.per_node.len(), 7);
}

#[test]
fn test_graph_json_round_trips_editor_shape() {
    let json = r#"{
        "nodes": [
            { "id": "1", "type": "ENTRY_COMMAND", "position": { "x": 0, "y": 0 },
              "data": { "name": "ping", "description": "Ping" } },
            { "id": "2", "type": "ACTION_RESPONSE_CREATE", "position": { "x": 0, "y": 120 },
              "data": { "message_data": { "content": "pong", "embeds": [{ "title": "t" }] } } }
        ],
        "edges": [ { "id": "e", "source": "1", "target": "2", "type": "REMOVABLE" } ]
    }"#;
    let graph = FlowGraph::from_json(json).expect("valid graph json");
    let compiled = compile_flow(graph).expect("Failed to compile");
    assert_eq!(compiled.credits.total, 2);

    let document: serde_json::Value =
        serde_json::from_str(&compiled.spec.to_json().unwrap()).unwrap();
    assert_eq!(document["nodes"][1]["type"], "ACTION_RESPONSE_CREATE");
    assert_eq!(document["edges"][0]["kind"], "REMOVABLE");
    assert_eq!(document["nodes"][1]["data"]["message_data"]["content"], "pong");
}

#[test]
fn test_unknown_node_type_fails_to_parse() {
    let json = r#"{ "nodes": [ { "id": "1", "type": "ACTION_TELEPORT" } ], "edges": [] }"#;
    let err = FlowGraph::from_json(json).unwrap_err();
    assert!(err.to_string().contains("unknown node type 'ACTION_TELEPORT'"));
}
