//! Typed payloads crossing the guest/host boundary.
//!
//! On the wire both directions use the same envelope, `{"type": ..., "data": ...}`.
//! Known types decode into their own variant so a malformed payload is caught
//! here rather than inside a handler. Types the shim does not know still
//! reach handlers as [`HostEvent::Custom`].

use super::abi::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The `{type, data}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl WireMessage {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandInteraction {
    pub id: String,
    pub command: String,
    pub user: User,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    pub author: User,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDeleted {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub guild_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEvent {
    pub guild_id: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: String,
    pub channel_id: String,
    pub message_id: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    pub emoji: String,
}

/// The host reporting that an earlier call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFailure {
    pub code: u32,
    #[serde(default)]
    pub call_type: String,
    #[serde(default)]
    pub message: String,
}

impl CallFailure {
    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_code(self.code)
    }
}

/// An event delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    CommandInteraction(CommandInteraction),
    MessageCreate(Message),
    MessageUpdate(Message),
    MessageDelete(MessageDeleted),
    GuildMemberAdd(MemberEvent),
    GuildMemberRemove(MemberEvent),
    MessageReactionAdd(Reaction),
    CallError(CallFailure),
    Custom { event_type: String, data: Value },
}

impl HostEvent {
    pub const COMMAND_INTERACTION: &'static str = "command_interaction";
    pub const MESSAGE_CREATE: &'static str = "message_create";
    pub const MESSAGE_UPDATE: &'static str = "message_update";
    pub const MESSAGE_DELETE: &'static str = "message_delete";
    pub const GUILD_MEMBER_ADD: &'static str = "guild_member_add";
    pub const GUILD_MEMBER_REMOVE: &'static str = "guild_member_remove";
    pub const MESSAGE_REACTION_ADD: &'static str = "message_reaction_add";
    pub const CALL_ERROR: &'static str = "call_error";

    /// The key handlers are registered under.
    pub fn event_type(&self) -> &str {
        match self {
            HostEvent::CommandInteraction(_) => Self::COMMAND_INTERACTION,
            HostEvent::MessageCreate(_) => Self::MESSAGE_CREATE,
            HostEvent::MessageUpdate(_) => Self::MESSAGE_UPDATE,
            HostEvent::MessageDelete(_) => Self::MESSAGE_DELETE,
            HostEvent::GuildMemberAdd(_) => Self::GUILD_MEMBER_ADD,
            HostEvent::GuildMemberRemove(_) => Self::GUILD_MEMBER_REMOVE,
            HostEvent::MessageReactionAdd(_) => Self::MESSAGE_REACTION_ADD,
            HostEvent::CallError(_) => Self::CALL_ERROR,
            HostEvent::Custom { event_type, .. } => event_type.as_str(),
        }
    }

    /// Decodes the payload of a known event type; unknown types become
    /// [`HostEvent::Custom`] with the payload as-is.
    pub fn from_wire(wire: WireMessage) -> Result<Self, serde_json::Error> {
        let WireMessage { kind, data } = wire;
        let event = match kind.as_str() {
            Self::COMMAND_INTERACTION => HostEvent::CommandInteraction(serde_json::from_value(data)?),
            Self::MESSAGE_CREATE => HostEvent::MessageCreate(serde_json::from_value(data)?),
            Self::MESSAGE_UPDATE => HostEvent::MessageUpdate(serde_json::from_value(data)?),
            Self::MESSAGE_DELETE => HostEvent::MessageDelete(serde_json::from_value(data)?),
            Self::GUILD_MEMBER_ADD => HostEvent::GuildMemberAdd(serde_json::from_value(data)?),
            Self::GUILD_MEMBER_REMOVE => HostEvent::GuildMemberRemove(serde_json::from_value(data)?),
            Self::MESSAGE_REACTION_ADD => {
                HostEvent::MessageReactionAdd(serde_json::from_value(data)?)
            }
            Self::CALL_ERROR => HostEvent::CallError(serde_json::from_value(data)?),
            _ => HostEvent::Custom {
                event_type: kind,
                data,
            },
        };
        Ok(event)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        Self::from_wire(serde_json::from_slice(bytes)?)
    }
}

/// Message content as the host's Discord layer expects it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Value>,
}

impl MessageData {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            embeds: Vec::new(),
        }
    }
}

/// A request from the guest to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum HostCall {
    InteractionResponseCreate {
        interaction_id: String,
        message: MessageData,
        #[serde(default)]
        ephemeral: bool,
    },
    MessageCreate {
        channel_id: String,
        message: MessageData,
    },
    MessageEdit {
        channel_id: String,
        message_id: String,
        message: MessageData,
    },
    MessageDelete {
        channel_id: String,
        message_id: String,
    },
    MemberBan {
        guild_id: String,
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    MemberKick {
        guild_id: String,
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    KvSet {
        key: String,
        value: Value,
    },
    KvDelete {
        key: String,
    },
    /// Anything not modelled above, sent exactly as given.
    #[serde(skip)]
    Raw(WireMessage),
}

impl HostCall {
    pub fn to_wire(&self) -> Result<WireMessage, serde_json::Error> {
        match self {
            HostCall::Raw(wire) => Ok(wire.clone()),
            typed => serde_json::from_value(serde_json::to_value(typed)?),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.to_wire()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_event_types_pass_through() {
        let event = HostEvent::from_json(br#"{"type":"A","data":{"n":1}}"#).unwrap();
        assert_eq!(event.event_type(), "A");
        assert_eq!(
            event,
            HostEvent::Custom {
                event_type: "A".to_string(),
                data: json!({ "n": 1 }),
            }
        );
    }

    #[test]
    fn known_event_with_wrong_shape_is_rejected() {
        let result = HostEvent::from_json(br#"{"type":"message_create","data":{"id":7}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn calls_use_the_type_data_envelope() {
        let call = HostCall::MessageCreate {
            channel_id: "42".to_string(),
            message: MessageData::text("hi"),
        };
        let wire = call.to_wire().unwrap();
        assert_eq!(wire.kind, "message_create");
        assert_eq!(wire.data, json!({ "channel_id": "42", "message": { "content": "hi" } }));

        let raw = HostCall::Raw(WireMessage::new("custom", json!([1])));
        assert_eq!(raw.to_wire().unwrap(), WireMessage::new("custom", json!([1])));
    }
}
