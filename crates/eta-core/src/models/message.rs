use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Classify a raw role token. Only tokens that start with "user"
    /// (case-insensitively) map to [`Role::User`]; everything else,
    /// including a missing token, is the assistant.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(t) if t.to_lowercase().starts_with("user") => Role::User,
            _ => Role::Assistant,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: Option<String>,
    /// Present only on client-originated messages not yet confirmed by
    /// the server; cleared when the authoritative thread replaces them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimistic_id: Option<String>,
}

impl Message {
    /// Assistant message with no timestamp (e.g. upload confirmations,
    /// expanded-overlay content that never entered a thread).
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: None,
            optimistic_id: None,
        }
    }

    /// Assistant message stamped with the current time, for locally
    /// synthesized thread entries (notes, practice problems, voice
    /// delivery markers).
    pub fn assistant_now(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            optimistic_id: None,
        }
    }

    /// Optimistic user message with a fresh client-generated id.
    pub fn optimistic_user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            optimistic_id: Some(format!("local-{}", Uuid::new_v4())),
        }
    }

    pub fn is_optimistic(&self) -> bool {
        self.optimistic_id.is_some()
    }
}
