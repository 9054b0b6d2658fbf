use super::graph::NodeType;
use ahash::AHashMap;
use itertools::Itertools;
use serde_json::Value;

/// One problem with a node's `data` payload. `field` is a dotted path below
/// `data`, empty when the payload itself is wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Defines the contract for validating the `data` payload of one node type.
pub trait NodeSchema: Send + Sync {
    fn node_type(&self) -> NodeType;
    fn validate(&self, data: &Value) -> Vec<FieldViolation>;
}

/// The value a field must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any JSON value.
    Any,
    /// A string, possibly empty.
    String,
    /// A non-blank string.
    Text,
    /// A Discord id (digits) or a `{{placeholder}}` resolved at run time.
    Snowflake,
    Integer { min: i64, max: i64 },
    Bool,
    Object,
    Enum(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// Checks an object payload against a list of field rules.
pub fn check_fields(data: &Value, rules: &[FieldRule]) -> Vec<FieldViolation> {
    let empty = serde_json::Map::new();
    let object = match data {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return vec![FieldViolation::new("", "expected object")],
    };

    let mut violations = Vec::new();
    for rule in rules {
        match object.get(rule.name) {
            None | Some(Value::Null) => {
                if rule.required {
                    violations.push(FieldViolation::new(rule.name, "required"));
                }
            }
            Some(value) => {
                if let Some(message) = check_kind(rule.kind, value) {
                    violations.push(FieldViolation::new(rule.name, message));
                }
            }
        }
    }
    violations
}

fn check_kind(kind: FieldKind, value: &Value) -> Option<String> {
    match kind {
        FieldKind::Any => None,
        FieldKind::String => (!value.is_string()).then(|| "expected string".to_string()),
        FieldKind::Text => match value.as_str() {
            None => Some("expected string".to_string()),
            Some(s) if s.trim().is_empty() => Some("must not be empty".to_string()),
            Some(_) => None,
        },
        FieldKind::Snowflake => match value.as_str() {
            None => Some("expected string".to_string()),
            Some(s) if is_snowflake(s) || is_placeholder(s) => None,
            Some(_) => Some("must be a numeric id or a {{placeholder}}".to_string()),
        },
        FieldKind::Integer { min, max } => match value.as_i64() {
            None => Some("expected integer".to_string()),
            Some(n) if n < min || n > max => Some(format!("must be between {} and {}", min, max)),
            Some(_) => None,
        },
        FieldKind::Bool => (!value.is_boolean()).then(|| "expected boolean".to_string()),
        FieldKind::Object => (!value.is_object()).then(|| "expected object".to_string()),
        FieldKind::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => None,
            _ => Some(format!("must be one of: {}", allowed.iter().join(", "))),
        },
    }
}

fn is_snowflake(s: &str) -> bool {
    !s.is_empty() && s.len() <= 20 && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_placeholder(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.len() > 4 && trimmed.starts_with("{{") && trimmed.ends_with("}}")
}

const EVENT_TYPES: &[&str] = &[
    "message_create",
    "message_update",
    "message_delete",
    "guild_member_add",
    "guild_member_remove",
    "message_reaction_add",
];
const COMPARE_MODES: &[&str] = &[
    "equal",
    "not_equal",
    "greater_than",
    "greater_than_or_equal",
    "less_than",
    "less_than_or_equal",
    "contains",
];
const FILTER_TARGETS: &[&str] = &["message_content", "channel_id", "user_id", "guild_id"];
const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];
const VARIABLE_SCOPES: &[&str] = &["global", "guild", "channel", "user"];
const LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error"];

const ID: FieldKind = FieldKind::Snowflake;
const TEXT: FieldKind = FieldKind::Text;
const STRING: FieldKind = FieldKind::String;
const ANY: FieldKind = FieldKind::Any;
const BOOL: FieldKind = FieldKind::Bool;
const OBJECT: FieldKind = FieldKind::Object;

/// Master macro to define the schema of every node type and its registration.
macro_rules! define_node_schemas {
    ( $( ($struct_name:ident, $node_type:expr, [ $( $field:literal : $kind:expr, $required:literal );* $(;)? ]) ),* $(,)? ) => {
        $(
            struct $struct_name;
            impl NodeSchema for $struct_name {
                fn node_type(&self) -> NodeType { $node_type }
                fn validate(&self, data: &Value) -> Vec<FieldViolation> {
                    check_fields(data, &[ $( FieldRule { name: $field, kind: $kind, required: $required } ),* ])
                }
            }
        )*

        pub(super) fn register_default_schemas(registry: &mut AHashMap<NodeType, Box<dyn NodeSchema>>) {
            $( registry.insert($node_type, Box::new($struct_name)); )*
        }
    };
}

define_node_schemas! {
    (EntryCommandSchema, NodeType::EntryCommand, [
        "name": FieldKind::Text, true;
        "description": TEXT, true;
    ]),
    (EntryEventSchema, NodeType::EntryEvent, [
        "event_type": FieldKind::Enum(EVENT_TYPES), true;
    ]),

    (ResponseCreateSchema, NodeType::ActionResponseCreate, [
        "message_data": OBJECT, true;
        "ephemeral": BOOL, false;
    ]),
    (ResponseEditSchema, NodeType::ActionResponseEdit, [
        "message_data": OBJECT, true;
    ]),
    (ResponseDeleteSchema, NodeType::ActionResponseDelete, []),
    (MessageCreateSchema, NodeType::ActionMessageCreate, [
        "channel_id": ID, true;
        "message_data": OBJECT, true;
    ]),
    (MessageEditSchema, NodeType::ActionMessageEdit, [
        "channel_id": ID, true;
        "message_id": ID, true;
        "message_data": OBJECT, true;
    ]),
    (MessageDeleteSchema, NodeType::ActionMessageDelete, [
        "channel_id": ID, true;
        "message_id": ID, true;
        "reason": STRING, false;
    ]),
    (MemberBanSchema, NodeType::ActionMemberBan, [
        "user_id": ID, true;
        "reason": STRING, false;
        "delete_message_days": FieldKind::Integer { min: 0, max: 7 }, false;
    ]),
    (MemberKickSchema, NodeType::ActionMemberKick, [
        "user_id": ID, true;
        "reason": STRING, false;
    ]),
    (MemberTimeoutSchema, NodeType::ActionMemberTimeout, [
        "user_id": ID, true;
        "duration_seconds": FieldKind::Integer { min: 1, max: 2_419_200 }, true;
        "reason": STRING, false;
    ]),
    (HttpRequestSchema, NodeType::ActionHttpRequest, [
        "url": TEXT, true;
        "method": FieldKind::Enum(HTTP_METHODS), true;
        "headers": OBJECT, false;
        "body": STRING, false;
    ]),
    (VariableSetSchema, NodeType::ActionVariableSet, [
        "name": TEXT, true;
        "value": ANY, true;
        "scope": FieldKind::Enum(VARIABLE_SCOPES), false;
    ]),
    (VariableDeleteSchema, NodeType::ActionVariableDelete, [
        "name": TEXT, true;
        "scope": FieldKind::Enum(VARIABLE_SCOPES), false;
    ]),
    (LogSchema, NodeType::ActionLog, [
        "message": TEXT, true;
        "level": FieldKind::Enum(LOG_LEVELS), false;
    ]),

    (ConditionCompareSchema, NodeType::ConditionCompare, [
        "base_value": ANY, true;
    ]),
    (ConditionPermissionsSchema, NodeType::ConditionPermissions, [
        "permissions": TEXT, true;
    ]),
    (ConditionItemCompareSchema, NodeType::ConditionItemCompare, [
        "mode": FieldKind::Enum(COMPARE_MODES), true;
        "value": ANY, true;
    ]),
    (ConditionItemElseSchema, NodeType::ConditionItemElse, []),

    (OptionTextSchema, NodeType::OptionCommandText, [
        "name": TEXT, true;
        "description": TEXT, true;
        "required": BOOL, false;
    ]),
    (OptionNumberSchema, NodeType::OptionCommandNumber, [
        "name": TEXT, true;
        "description": TEXT, true;
        "required": BOOL, false;
    ]),
    (OptionUserSchema, NodeType::OptionCommandUser, [
        "name": TEXT, true;
        "description": TEXT, true;
        "required": BOOL, false;
    ]),
    (OptionChannelSchema, NodeType::OptionCommandChannel, [
        "name": TEXT, true;
        "description": TEXT, true;
        "required": BOOL, false;
    ]),
    (OptionRoleSchema, NodeType::OptionCommandRole, [
        "name": TEXT, true;
        "description": TEXT, true;
        "required": BOOL, false;
    ]),
    (OptionAttachmentSchema, NodeType::OptionCommandAttachment, [
        "name": TEXT, true;
        "description": TEXT, true;
        "required": BOOL, false;
    ]),
    (OptionPermissionsSchema, NodeType::OptionCommandPermissions, [
        "permissions": TEXT, true;
    ]),
    (OptionEventFilterSchema, NodeType::OptionEventFilter, [
        "target": FieldKind::Enum(FILTER_TARGETS), true;
        "mode": FieldKind::Enum(COMPARE_MODES), true;
        "value": ANY, true;
    ]),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_node_type_has_a_default_schema() {
        let mut registry = AHashMap::new();
        register_default_schemas(&mut registry);
        for node_type in NodeType::ALL {
            let schema = registry.get(node_type).expect("missing schema");
            assert_eq!(schema.node_type(), *node_type);
        }
    }

    #[test]
    fn missing_and_null_required_fields_are_reported() {
        let rules = [
            FieldRule { name: "channel_id", kind: ID, required: true },
            FieldRule { name: "reason", kind: STRING, required: false },
        ];
        let violations = check_fields(&json!({ "channel_id": null }), &rules);
        assert_eq!(violations, vec![FieldViolation::new("channel_id", "required")]);
        assert!(check_fields(&json!({ "channel_id": "123" }), &rules).is_empty());
    }

    #[test]
    fn field_kinds_are_enforced() {
        assert_eq!(check_kind(ID, &json!("{{interaction.channel.id}}")), None);
        assert_eq!(check_kind(ID, &json!("12345")), None);
        assert!(check_kind(ID, &json!("general")).is_some());
        assert_eq!(
            check_kind(FieldKind::Integer { min: 0, max: 7 }, &json!(9)),
            Some("must be between 0 and 7".to_string())
        );
        assert_eq!(
            check_kind(FieldKind::Enum(HTTP_METHODS), &json!("TRACE")),
            Some("must be one of: GET, POST, PUT, PATCH, DELETE".to_string())
        );
        assert_eq!(check_kind(TEXT, &json!("   ")), Some("must not be empty".to_string()));
    }

    #[test]
    fn non_object_payload_is_rejected_as_a_whole() {
        let violations = check_fields(&json!([1, 2]), &[]);
        assert_eq!(violations, vec![FieldViolation::new("", "expected object")]);
    }
}
