//! Realtime channel contract: events the widget emits and receives.

use crate::{rest::CountryInfo, ChatStatus, ConversationId, ProtocolError, TenantCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a transcript message.
///
/// The wire carries senders as plain strings (`user`, `bot`, `ai`,
/// `staff-<name>`, `owner`); unrecognized values fall back to [`Sender::Bot`]
/// so a malformed event still renders with the default presentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sender {
    Visitor,
    Bot,
    AiAssistant,
    Staff(String),
    Owner,
}

impl From<&str> for Sender {
    fn from(value: &str) -> Self {
        match value {
            "user" => Self::Visitor,
            "bot" => Self::Bot,
            "ai" => Self::AiAssistant,
            "owner" => Self::Owner,
            other => match other.strip_prefix("staff-") {
                Some(name) => Self::Staff(name.to_owned()),
                None => Self::Bot,
            },
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visitor => f.write_str("user"),
            Self::Bot => f.write_str("bot"),
            Self::AiAssistant => f.write_str("ai"),
            Self::Staff(name) => write!(f, "staff-{name}"),
            Self::Owner => f.write_str("owner"),
        }
    }
}

impl Serialize for Sender {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Sender {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// Horizontal placement of a message bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleAlignment {
    Start,
    End,
}

/// Avatar shown next to a message bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarKind {
    None,
    Bot,
    Sparkles,
    Person,
    Crown,
}

/// Presentation capability for anything rendered as a message author.
pub trait Presentable {
    /// Translation key for the author label, or `None` when the label is a
    /// literal name.
    fn label_key(&self) -> Option<&'static str>;
    fn alignment(&self) -> BubbleAlignment;
    fn avatar(&self) -> AvatarKind;
}

impl Presentable for Sender {
    fn label_key(&self) -> Option<&'static str> {
        match self {
            Self::Visitor => Some("You"),
            Self::Bot => Some("Bot"),
            Self::AiAssistant => Some("AI Assistant"),
            Self::Staff(_) => None,
            Self::Owner => Some("Owner"),
        }
    }

    fn alignment(&self) -> BubbleAlignment {
        match self {
            Self::Visitor => BubbleAlignment::End,
            _ => BubbleAlignment::Start,
        }
    }

    fn avatar(&self) -> AvatarKind {
        match self {
            Self::Visitor => AvatarKind::None,
            Self::Bot => AvatarKind::Bot,
            Self::AiAssistant => AvatarKind::Sparkles,
            Self::Staff(_) => AvatarKind::Person,
            Self::Owner => AvatarKind::Crown,
        }
    }
}

/// Parameters for opening the realtime connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    pub chatbot_code: TenantCode,
    #[serde(rename = "currentWebsiteURL")]
    pub current_website_url: String,
}

/// Payload of the outbound `join_chat` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinChat {
    pub chat_id: ConversationId,
}

/// Payload of the outbound `create_new_chat` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewChat {
    pub chatbot_code: TenantCode,
    pub email: String,
    pub country: CountryInfo,
}

/// Payload of the outbound `message` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub chatbot_code: TenantCode,
    pub chat_id: ConversationId,
    pub email: String,
    pub message: String,
    #[serde(rename = "currentWebsiteURL")]
    pub current_website_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

/// Events emitted by the widget over the realtime channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    JoinChat(JoinChat),
    CreateNewChat(CreateNewChat),
    Message(OutgoingMessage),
}

impl ClientEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinChat(_) => "join_chat",
            Self::CreateNewChat(_) => "create_new_chat",
            Self::Message(_) => "message",
        }
    }

    /// Wire payload of the event, for transport adapters.
    pub fn payload(&self) -> crate::Result<serde_json::Value> {
        let encode = |r: serde_json::Result<serde_json::Value>| {
            r.map_err(|source| ProtocolError::Payload {
                event: self.name().to_owned(),
                source,
            })
        };
        match self {
            Self::JoinChat(p) => encode(serde_json::to_value(p)),
            Self::CreateNewChat(p) => encode(serde_json::to_value(p)),
            Self::Message(p) => encode(serde_json::to_value(p)),
        }
    }
}

/// Payload of the inbound `new_chat_data` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChatData {
    pub chat: ChatRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRef {
    #[serde(rename = "_id")]
    pub id: ConversationId,
}

/// Payload of the inbound `reply` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub sender: Sender,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

/// Payload of the inbound `chat_update` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUpdate {
    pub chat_id: ConversationId,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sender: Option<Sender>,
    #[serde(default)]
    pub status: Option<ChatStatus>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

/// Events delivered to the widget over the realtime channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    NewChatData(NewChatData),
    Reply(Reply),
    BotTypingStart,
    BotTypingStop,
    ChatUpdate(ChatUpdate),
}

impl ServerEvent {
    /// Decodes a named event and its payload as delivered by a transport
    /// adapter.
    pub fn parse(name: &str, payload: serde_json::Value) -> crate::Result<Self> {
        fn decode<T: serde::de::DeserializeOwned>(
            name: &str,
            payload: serde_json::Value,
        ) -> crate::Result<T> {
            serde_json::from_value(payload).map_err(|source| ProtocolError::Payload {
                event: name.to_owned(),
                source,
            })
        }
        match name {
            "new_chat_data" => Ok(Self::NewChatData(decode(name, payload)?)),
            "reply" => Ok(Self::Reply(decode(name, payload)?)),
            "bot_typing_start" => Ok(Self::BotTypingStart),
            "bot_typing_stop" => Ok(Self::BotTypingStop),
            "chat_update" => Ok(Self::ChatUpdate(decode(name, payload)?)),
            other => Err(ProtocolError::UnknownEvent(other.to_owned())),
        }
    }
}
