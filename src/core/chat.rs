use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed prompt/reply exchange kept in the persisted history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    pub id: i64,
    #[serde(rename = "message")]
    pub prompt: String,
    #[serde(rename = "response")]
    pub reply: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl ChatHistoryEntry {
    pub fn new(id: i64, prompt: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            reply: reply.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A transcript line for the current session. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub content: String,
    pub role: Role,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role,
        }
    }
}
