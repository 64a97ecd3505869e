//! Raw server payload shapes.
//!
//! The backend ships messages in three shapes: an ordered
//! `[role, content, timestamp?]` array, a keyed object with several
//! accepted field-name aliases, or a bare string. The union is modeled
//! explicitly so shape dispatch happens before any field extraction.

use serde::Deserialize;
use serde_json::Value;

use super::message::{Message, Role};

/// A thread exactly as the backend ships it inside `ChatHistory`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawThread {
    #[serde(rename = "ChatID")]
    pub chat_id: Option<Value>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Messages", default)]
    pub messages: Vec<Value>,
    #[serde(rename = "CreatedAt")]
    pub created_at: Option<Value>,
    #[serde(rename = "UpdatedAt")]
    pub updated_at: Option<Value>,
}

/// One raw message entry, in any of the three accepted shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMessage {
    Tuple(Vec<Value>),
    Keyed(KeyedMessage),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyedMessage {
    #[serde(alias = "Role", alias = "author", alias = "speaker")]
    pub role: Option<Value>,
    #[serde(alias = "message", alias = "text", alias = "body")]
    pub content: Option<Value>,
    #[serde(alias = "created_at", alias = "time", alias = "date")]
    pub timestamp: Option<Value>,
}

impl RawMessage {
    pub fn parse(entry: &Value) -> Option<Self> {
        serde_json::from_value(entry.clone()).ok()
    }

    /// Normalize into a canonical [`Message`], or `None` when the entry
    /// is unusable (too-short tuple, missing content, content empty
    /// after trimming).
    pub fn into_message(self) -> Option<Message> {
        match self {
            RawMessage::Tuple(items) => {
                if items.len() < 2 {
                    return None;
                }
                let role = Role::from_token(items[0].as_str());
                let content = coerce_content(&items[1])?;
                let timestamp = items.get(2).and_then(coerce_timestamp);
                Some(Message {
                    role,
                    content,
                    timestamp,
                    optimistic_id: None,
                })
            }
            RawMessage::Keyed(keyed) => {
                let content = keyed.content.as_ref().and_then(coerce_content)?;
                let role = Role::from_token(keyed.role.as_ref().and_then(Value::as_str));
                let timestamp = keyed.timestamp.as_ref().and_then(coerce_timestamp);
                Some(Message {
                    role,
                    content,
                    timestamp,
                    optimistic_id: None,
                })
            }
            RawMessage::Text(text) => {
                if text.trim().is_empty() {
                    return None;
                }
                Some(Message {
                    role: Role::Assistant,
                    content: text,
                    timestamp: None,
                    optimistic_id: None,
                })
            }
        }
    }
}

/// Stringify a scalar the way the original frontend did. Returns `None`
/// for null content or content that trims to nothing; the untrimmed
/// text is kept otherwise.
fn coerce_content(value: &Value) -> Option<String> {
    let text = stringify(value)?;
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn coerce_timestamp(value: &Value) -> Option<String> {
    let text = stringify(value)?;
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub(crate) fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_of(value: Value) -> Option<Message> {
        RawMessage::parse(&value).and_then(RawMessage::into_message)
    }

    #[test]
    fn test_tuple_shape_with_timestamp() {
        let msg = message_of(json!(["User", "2+2=4", "t1"])).unwrap();
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "2+2=4");
        assert_eq!(msg.timestamp.as_deref(), Some("t1"));
    }

    #[test]
    fn test_tuple_shape_without_timestamp() {
        let msg = message_of(json!(["Bot", "Sure!"])).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "Sure!");
        assert_eq!(msg.timestamp, None);
    }

    #[test]
    fn test_tuple_too_short_dropped() {
        assert!(message_of(json!(["orphan"])).is_none());
        assert!(message_of(json!([])).is_none());
    }

    #[test]
    fn test_tuple_numeric_content_stringified() {
        let msg = message_of(json!(["assistant", 42, null])).unwrap();
        assert_eq!(msg.content, "42");
        assert_eq!(msg.timestamp, None);
    }

    #[test]
    fn test_keyed_shape_field_aliases() {
        let msg = message_of(json!({
            "speaker": "user-7",
            "body": "hello there",
            "created_at": "2024-05-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello there");
        assert_eq!(msg.timestamp.as_deref(), Some("2024-05-01T00:00:00Z"));
    }

    #[test]
    fn test_keyed_shape_missing_role_is_assistant() {
        let msg = message_of(json!({ "text": "reply" })).unwrap();
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn test_keyed_shape_empty_content_dropped() {
        assert!(message_of(json!({ "role": "user", "content": "   " })).is_none());
        assert!(message_of(json!({ "role": "user", "content": null })).is_none());
        assert!(message_of(json!({ "role": "user" })).is_none());
    }

    #[test]
    fn test_bare_string_is_assistant() {
        let msg = message_of(json!("plain reply")).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "plain reply");
        assert_eq!(msg.timestamp, None);
    }

    #[test]
    fn test_bare_empty_string_dropped() {
        assert!(message_of(json!("")).is_none());
        assert!(message_of(json!("  \t ")).is_none());
    }

    #[test]
    fn test_unusable_entries_rejected() {
        assert!(RawMessage::parse(&json!(null)).is_none());
        assert!(RawMessage::parse(&json!(7)).is_none());
    }
}
