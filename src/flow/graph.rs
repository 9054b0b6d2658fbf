use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A node/edge graph as authored in the visual editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Editor layout only.
    #[serde(default)]
    pub position: Position,
    /// Payload whose shape depends on `node_type`.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl FlowNode {
    pub fn new(id: impl Into<String>, node_type: NodeType, data: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            node_type,
            position: Position::default(),
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, alias = "type")]
    pub kind: EdgeKind,
}

impl FlowEdge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        kind: EdgeKind,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind,
        }
    }
}

/// `Fixed` edges are structural and cannot be deleted in the editor;
/// `Removable` edges are user-chosen control flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Fixed,
    #[default]
    Removable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    Entry,
    Action,
    Condition,
    ConditionItem,
    Option,
}

macro_rules! define_node_types {
    ( $( $variant:ident => $tag:literal, $category:ident ),* $(,)? ) => {
        /// The closed set of node types the editor can place.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeType {
            $( $variant, )*
        }

        impl NodeType {
            pub const ALL: &'static [NodeType] = &[ $( NodeType::$variant, )* ];

            pub fn as_str(self) -> &'static str {
                match self {
                    $( NodeType::$variant => $tag, )*
                }
            }

            pub fn category(self) -> NodeCategory {
                match self {
                    $( NodeType::$variant => NodeCategory::$category, )*
                }
            }
        }

        impl FromStr for NodeType {
            type Err = UnknownNodeType;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $tag => Ok(NodeType::$variant), )*
                    other => Err(UnknownNodeType(other.to_string())),
                }
            }
        }
    };
}

define_node_types! {
    EntryCommand => "ENTRY_COMMAND", Entry,
    EntryEvent => "ENTRY_EVENT", Entry,

    ActionResponseCreate => "ACTION_RESPONSE_CREATE", Action,
    ActionResponseEdit => "ACTION_RESPONSE_EDIT", Action,
    ActionResponseDelete => "ACTION_RESPONSE_DELETE", Action,
    ActionMessageCreate => "ACTION_MESSAGE_CREATE", Action,
    ActionMessageEdit => "ACTION_MESSAGE_EDIT", Action,
    ActionMessageDelete => "ACTION_MESSAGE_DELETE", Action,
    ActionMemberBan => "ACTION_MEMBER_BAN", Action,
    ActionMemberKick => "ACTION_MEMBER_KICK", Action,
    ActionMemberTimeout => "ACTION_MEMBER_TIMEOUT", Action,
    ActionHttpRequest => "ACTION_HTTP_REQUEST", Action,
    ActionVariableSet => "ACTION_VARIABLE_SET", Action,
    ActionVariableDelete => "ACTION_VARIABLE_DELETE", Action,
    ActionLog => "ACTION_LOG", Action,

    ConditionCompare => "CONDITION_COMPARE", Condition,
    ConditionPermissions => "CONDITION_PERMISSIONS", Condition,
    ConditionItemCompare => "CONDITION_ITEM_COMPARE", ConditionItem,
    ConditionItemElse => "CONDITION_ITEM_ELSE", ConditionItem,

    OptionCommandText => "OPTION_COMMAND_TEXT", Option,
    OptionCommandNumber => "OPTION_COMMAND_NUMBER", Option,
    OptionCommandUser => "OPTION_COMMAND_USER", Option,
    OptionCommandChannel => "OPTION_COMMAND_CHANNEL", Option,
    OptionCommandRole => "OPTION_COMMAND_ROLE", Option,
    OptionCommandAttachment => "OPTION_COMMAND_ATTACHMENT", Option,
    OptionCommandPermissions => "OPTION_COMMAND_PERMISSIONS", Option,
    OptionEventFilter => "OPTION_EVENT_FILTER", Option,
}

impl NodeType {
    pub fn is_entry(self) -> bool {
        self.category() == NodeCategory::Entry
    }

    pub fn is_option(self) -> bool {
        self.category() == NodeCategory::Option
    }

    pub fn is_condition(self) -> bool {
        self.category() == NodeCategory::Condition
    }

    pub fn is_condition_item(self) -> bool {
        self.category() == NodeCategory::ConditionItem
    }

    /// The entry type an option node must be bound to.
    pub fn bound_entry(self) -> Option<NodeType> {
        match self {
            NodeType::OptionEventFilter => Some(NodeType::EntryEvent),
            t if t.is_option() => Some(NodeType::EntryCommand),
            _ => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown node type '{0}'")]
pub struct UnknownNodeType(pub String);
