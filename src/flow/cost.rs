use super::graph::{FlowNode, NodeType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Maps one node to its credit cost.
pub type CostFn = fn(&FlowNode) -> u64;

/// Credits a validated graph is expected to consume per run. Reporting only;
/// the host enforces the real limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditEstimate {
    pub total: u64,
    pub per_node: BTreeMap<String, u64>,
}

impl CreditEstimate {
    /// Sums `cost` over every node present, branches taken or not.
    pub fn compute<'a>(nodes: impl IntoIterator<Item = &'a FlowNode>, cost: CostFn) -> Self {
        let mut estimate = Self::default();
        for node in nodes {
            let credits = cost(node);
            estimate.total += credits;
            estimate.per_node.insert(node.id.clone(), credits);
        }
        estimate
    }
}

/// The built-in credit table.
pub fn default_cost(node: &FlowNode) -> u64 {
    match node.node_type {
        NodeType::ActionResponseCreate
        | NodeType::ActionResponseEdit
        | NodeType::ActionMessageCreate
        | NodeType::ActionMessageEdit => 1 + embed_count(&node.data),
        NodeType::ActionResponseDelete | NodeType::ActionMessageDelete => 1,
        NodeType::ActionMemberBan | NodeType::ActionMemberKick | NodeType::ActionMemberTimeout => 2,
        NodeType::ActionHttpRequest => 5,
        NodeType::ActionVariableSet | NodeType::ActionVariableDelete => 1,
        NodeType::ConditionCompare | NodeType::ConditionPermissions => 1,
        // Everything else is free.
        _ => 0,
    }
}

fn embed_count(data: &Value) -> u64 {
    data.pointer("/message_data/embeds")
        .and_then(Value::as_array)
        .map_or(0, |embeds| embeds.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_actions_charge_per_embed() {
        let node = FlowNode::new(
            "3",
            NodeType::ActionResponseCreate,
            json!({ "message_data": { "content": "hi", "embeds": [{}, {}] } }),
        );
        assert_eq!(default_cost(&node), 3);
    }

    #[test]
    fn estimate_is_a_plain_sum() {
        let nodes = [
            FlowNode::new("1", NodeType::EntryCommand, json!({})),
            FlowNode::new("2", NodeType::ConditionCompare, json!({})),
            FlowNode::new("3", NodeType::ActionHttpRequest, json!({})),
            FlowNode::new("4", NodeType::ActionMemberBan, json!({})),
        ];
        let estimate = CreditEstimate::compute(&nodes, default_cost);
        assert_eq!(estimate.total, 8);
        assert_eq!(estimate.per_node["1"], 0);
        assert_eq!(estimate.per_node["3"], 5);
    }
}
