//! REST payload models for the widget's backend endpoints.

use crate::{events::Sender, ArticleId, ChatStatus, ConversationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One conversation row in the visitor's conversation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    #[serde(rename = "_id")]
    pub id: ConversationId,
    pub name: String,
    pub status: ChatStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One stored transcript entry as returned by the chat-history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub sender: Sender,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

/// Full history of one conversation.
///
/// The backend stores the message list as a JSON-encoded string inside the
/// chat document; both that form and a plain array are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatHistory {
    pub status: ChatStatus,
    #[serde(default, deserialize_with = "stringified_messages")]
    pub messages: Vec<StoredMessage>,
}

fn stringified_messages<'de, D>(deserializer: D) -> Result<Vec<StoredMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Encoded(String),
        Plain(Vec<StoredMessage>),
    }
    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(Raw::Plain(messages)) => Ok(messages),
        Some(Raw::Encoded(json)) => serde_json::from_str(&json).map_err(serde::de::Error::custom),
    }
}

/// One help article as listed by the FAQ endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: ArticleId,
    pub title: String,
    pub description: String,
}

/// Response of the FAQ list endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FaqList {
    pub faqs: Vec<Article>,
}

/// Response of the FAQ body endpoint; `answer` is markdown source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArticleBody {
    pub answer: String,
}

/// Response of the file-upload endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    pub data: UploadData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadData {
    pub url: String,
}

/// Country metadata attached to a newly created conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryInfo {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub flag: String,
}
