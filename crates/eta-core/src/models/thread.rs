use serde_json::Value;

use super::message::{Message, Role};
use super::raw::{stringify, RawMessage, RawThread};
use crate::constants::SESSION_TITLE_PREFIX;
use crate::preview::format_message_preview;

/// Canonical in-memory thread, hydrated from a raw server payload.
#[derive(Debug, Clone)]
pub struct Thread {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Derived preview of the latest assistant reply; see
    /// [`Thread::summarize`].
    pub summary: String,
    /// Original server payload, kept verbatim.
    pub raw: Value,
}

impl Thread {
    /// Hydrate a raw server thread. `index` is the positional fallback
    /// used for the id and the title when the payload carries neither.
    /// Returns `None` if the input is not a usable object.
    pub fn from_raw(raw: &Value, index: usize) -> Option<Self> {
        if !raw.is_object() {
            return None;
        }
        let parsed: RawThread = serde_json::from_value(raw.clone()).ok()?;

        let id = parsed
            .chat_id
            .as_ref()
            .and_then(stringify)
            .unwrap_or_else(|| index.to_string());
        let title = parsed
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("{} {}", SESSION_TITLE_PREFIX, index + 1));

        let messages: Vec<Message> = parsed
            .messages
            .iter()
            .filter_map(RawMessage::parse)
            .filter_map(RawMessage::into_message)
            .collect();

        let summary = Self::summarize(&messages);

        Some(Thread {
            id,
            title,
            messages,
            created_at: parsed.created_at.as_ref().and_then(stringify),
            updated_at: parsed.updated_at.as_ref().and_then(stringify),
            summary,
            raw: raw.clone(),
        })
    }

    /// Resolve the server-assigned id from a raw payload, if present.
    pub fn resolve_id(raw: &Value) -> Option<String> {
        raw.get("ChatID").and_then(stringify)
    }

    /// Preview of the most recent assistant message, else the most
    /// recent message overall, else the empty-state sentinel.
    pub fn summarize(messages: &[Message]) -> String {
        let source = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .or_else(|| messages.last())
            .map(|m| m.content.as_str())
            .unwrap_or("");
        format_message_preview(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EMPTY_PREVIEW;
    use serde_json::json;

    #[test]
    fn test_hydrates_mixed_message_shapes() {
        let raw = json!({
            "ChatID": "abc-1",
            "Title": "Physics",
            "Messages": [
                ["User", "2+2=4", "t1"],
                { "role": "assistant", "content": "Correct." },
                "Closing remark",
                ["", "", "t2"],
            ],
        });

        let thread = Thread::from_raw(&raw, 0).unwrap();
        assert_eq!(thread.id, "abc-1");
        assert_eq!(thread.title, "Physics");
        assert_eq!(thread.messages.len(), 3);
        assert_eq!(thread.messages[0].role, Role::User);
        assert_eq!(thread.messages[0].timestamp.as_deref(), Some("t1"));
        assert_eq!(thread.messages[1].content, "Correct.");
        assert_eq!(thread.messages[2].role, Role::Assistant);
    }

    #[test]
    fn test_non_object_input_is_none() {
        assert!(Thread::from_raw(&json!(null), 0).is_none());
        assert!(Thread::from_raw(&json!("thread"), 0).is_none());
        assert!(Thread::from_raw(&json!([1, 2]), 0).is_none());
    }

    #[test]
    fn test_id_and_title_fallbacks() {
        let thread = Thread::from_raw(&json!({ "Messages": [] }), 4).unwrap();
        assert_eq!(thread.id, "4");
        assert_eq!(thread.title, "Session 5");
    }

    #[test]
    fn test_numeric_chat_id_stringified() {
        let thread = Thread::from_raw(&json!({ "ChatID": 17 }), 0).unwrap();
        assert_eq!(thread.id, "17");
        assert_eq!(Thread::resolve_id(&json!({ "ChatID": 17 })).as_deref(), Some("17"));
    }

    #[test]
    fn test_summary_prefers_latest_assistant() {
        let raw = json!({
            "ChatID": "s",
            "Messages": [
                ["assistant", "first answer"],
                ["user", "follow-up question"],
            ],
        });
        let thread = Thread::from_raw(&raw, 0).unwrap();
        assert_eq!(thread.summary, "first answer");
    }

    #[test]
    fn test_summary_falls_back_to_latest_message() {
        let raw = json!({
            "ChatID": "s",
            "Messages": [["user", "only me here"]],
        });
        let thread = Thread::from_raw(&raw, 0).unwrap();
        assert_eq!(thread.summary, "only me here");
    }

    #[test]
    fn test_summary_empty_thread_sentinel() {
        let thread = Thread::from_raw(&json!({ "ChatID": "s" }), 0).unwrap();
        assert_eq!(thread.summary, EMPTY_PREVIEW);
    }

    #[test]
    fn test_empty_entries_do_not_affect_summary() {
        let raw = json!({
            "ChatID": "s",
            "Messages": [
                ["user", "real question"],
                ["assistant", "   "],
            ],
        });
        let thread = Thread::from_raw(&raw, 0).unwrap();
        assert_eq!(thread.messages.len(), 1);
        assert_eq!(thread.summary, "real question");
    }

    #[test]
    fn test_raw_payload_kept_verbatim() {
        let raw = json!({ "ChatID": "keep", "Extra": { "k": 1 } });
        let thread = Thread::from_raw(&raw, 0).unwrap();
        assert_eq!(thread.raw, raw);
    }
}
