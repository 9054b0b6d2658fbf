//! Common test utilities for building workspaces and flow graphs.
use kestrel::flow::{EdgeKind, FlowEdge, FlowGraph, FlowNode, NodeType};
use kestrel::vfs::VirtualFileMap;
use serde_json::json;

/// Builds a file map from `(path, content)` pairs.
#[allow(dead_code)]
pub fn files(entries: &[(&str, &str)]) -> VirtualFileMap {
    entries.iter().copied().collect()
}

/// Two TypeScript modules: `index.ts` imports `x` from `./a`.
#[allow(dead_code)]
pub fn two_module_workspace() -> VirtualFileMap {
    files(&[
        ("index.ts", "import {x} from './a'; x()"),
        ("a.ts", "export const x=()=>1"),
    ])
}

#[allow(dead_code)]
pub fn node(id: &str, node_type: NodeType, data: serde_json::Value) -> FlowNode {
    FlowNode::new(id, node_type, data)
}

#[allow(dead_code)]
pub fn fixed(id: &str, source: &str, target: &str) -> FlowEdge {
    FlowEdge::new(id, source, target, EdgeKind::Fixed)
}

#[allow(dead_code)]
pub fn removable(id: &str, source: &str, target: &str) -> FlowEdge {
    FlowEdge::new(id, source, target, EdgeKind::Removable)
}

#[allow(dead_code)]
pub fn command_entry(id: &str) -> FlowNode {
    node(
        id,
        NodeType::EntryCommand,
        json!({ "name": "greet", "description": "Say hello" }),
    )
}

#[allow(dead_code)]
pub fn event_entry(id: &str) -> FlowNode {
    node(id, NodeType::EntryEvent, json!({ "event_type": "message_create" }))
}

#[allow(dead_code)]
pub fn text_option(id: &str) -> FlowNode {
    node(
        id,
        NodeType::OptionCommandText,
        json!({ "name": "who", "description": "Who to greet", "required": true }),
    )
}

#[allow(dead_code)]
pub fn respond(id: &str) -> FlowNode {
    node(
        id,
        NodeType::ActionResponseCreate,
        json!({ "message_data": { "content": "Hello {{options.who}}" } }),
    )
}

#[allow(dead_code)]
pub fn log(id: &str) -> FlowNode {
    node(id, NodeType::ActionLog, json!({ "message": "ran" }))
}

/// ENTRY_COMMAND(1) <-FIXED- OPTION_COMMAND_TEXT(2); 1 -FIXED-> ACTION_RESPONSE_CREATE(3).
#[allow(dead_code)]
pub fn command_graph() -> FlowGraph {
    FlowGraph {
        nodes: vec![command_entry("1"), text_option("2"), respond("3")],
        edges: vec![fixed("e2-1", "2", "1"), fixed("e1-3", "1", "3")],
    }
}

/// A command that branches on a comparison:
///
/// ```text
/// 1 (entry) -> 2 (compare) -> 3 (else) -> 6 (log)
///                          -> 4 (item) -> 7 (respond)
///                          -> 5 (item)
/// ```
#[allow(dead_code)]
pub fn condition_graph() -> FlowGraph {
    FlowGraph {
        nodes: vec![
            command_entry("1"),
            node(
                "2",
                NodeType::ConditionCompare,
                json!({ "base_value": "{{options.count}}" }),
            ),
            node("3", NodeType::ConditionItemElse, json!({})),
            node(
                "4",
                NodeType::ConditionItemCompare,
                json!({ "mode": "greater_than", "value": 10 }),
            ),
            node(
                "5",
                NodeType::ConditionItemCompare,
                json!({ "mode": "equal", "value": 0 }),
            ),
            log("6"),
            respond("7"),
        ],
        edges: vec![
            removable("e1-2", "1", "2"),
            fixed("e2-3", "2", "3"),
            fixed("e2-4", "2", "4"),
            fixed("e2-5", "2", "5"),
            removable("e3-6", "3", "6"),
            removable("e4-7", "4", "7"),
        ],
    }
}
