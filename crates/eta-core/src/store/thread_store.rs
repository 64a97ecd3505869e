use serde_json::Value;
use tracing::debug;

use crate::models::{Message, Thread};
use crate::preview::format_message_preview;

/// Single source of truth for the thread collection and the active
/// selection. All writers go through these operations; none of them
/// can fail except by being a no-op on invalid input.
#[derive(Debug, Default)]
pub struct ThreadStore {
    threads: Vec<Thread>,
    active_thread_id: Option<String>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Reads ──────────────────────────────────────────────────────

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn get(&self, thread_id: &str) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == thread_id)
    }

    pub fn active_thread_id(&self) -> Option<&str> {
        self.active_thread_id.as_deref()
    }

    pub fn active_thread(&self) -> Option<&Thread> {
        self.active_thread_id
            .as_deref()
            .and_then(|id| self.get(id))
    }

    pub fn active_messages(&self) -> &[Message] {
        self.active_thread().map(|t| t.messages.as_slice()).unwrap_or(&[])
    }

    // ─── Writes ─────────────────────────────────────────────────────

    /// Hydrate `raw` and insert it (appended at the end) or replace the
    /// existing thread in place, keeping the ordering of every other
    /// thread. The resolved thread becomes active if nothing is.
    /// Returns the resolved id, or `None` when the payload is unusable.
    pub fn upsert_from_server(&mut self, raw: &Value, fallback_id: Option<&str>) -> Option<String> {
        let resolved_id = Thread::resolve_id(raw)
            .or_else(|| fallback_id.map(str::to_string))
            .filter(|id| !id.is_empty())?;

        let position = self.threads.iter().position(|t| t.id == resolved_id);
        let index = position.unwrap_or(self.threads.len());
        let mut thread = Thread::from_raw(raw, index)?;
        thread.id = resolved_id.clone();

        match position {
            Some(i) => self.threads[i] = thread,
            None => self.threads.push(thread),
        }
        if self.active_thread_id.is_none() {
            self.active_thread_id = Some(resolved_id.clone());
        }
        debug!(thread_id = %resolved_id, replaced = position.is_some(), "thread upserted");
        Some(resolved_id)
    }

    /// Replace the whole collection from an initial bundle load. The
    /// active selection is kept if it survives, else moved to the first
    /// thread, else cleared.
    pub fn replace_all(&mut self, threads: Vec<Thread>) {
        let active_survives = self
            .active_thread_id
            .as_deref()
            .is_some_and(|id| threads.iter().any(|t| t.id == id));
        if !active_survives {
            self.active_thread_id = threads.first().map(|t| t.id.clone());
        }
        self.threads = threads;
    }

    /// Append a message without contacting the server, recomputing the
    /// thread summary from the message content. No-op if the thread
    /// does not exist.
    pub fn append_optimistic(&mut self, thread_id: &str, message: Message) {
        if let Some(thread) = self.threads.iter_mut().find(|t| t.id == thread_id) {
            thread.summary = format_message_preview(&message.content);
            thread.messages.push(message);
        }
    }

    /// Remove the single message carrying `optimistic_id` from the
    /// named thread. Idempotent; safe on an already-reconciled thread.
    pub fn rollback_optimistic(&mut self, thread_id: &str, optimistic_id: &str) {
        if let Some(thread) = self.threads.iter_mut().find(|t| t.id == thread_id) {
            let before = thread.messages.len();
            thread
                .messages
                .retain(|m| m.optimistic_id.as_deref() != Some(optimistic_id));
            if thread.messages.len() != before {
                thread.summary = Thread::summarize(&thread.messages);
                debug!(thread_id, optimistic_id, "optimistic message rolled back");
            }
        }
    }

    /// Pure selection; the id is not validated against the collection.
    pub fn set_active(&mut self, thread_id: Option<&str>) {
        self.active_thread_id = thread_id.map(str::to_string);
    }

    pub fn clear(&mut self) {
        self.threads.clear();
        self.active_thread_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EMPTY_PREVIEW;
    use serde_json::json;

    fn store_with(raws: &[Value]) -> ThreadStore {
        let mut store = ThreadStore::new();
        for raw in raws {
            store.upsert_from_server(raw, None).unwrap();
        }
        store
    }

    #[test]
    fn test_upsert_inserts_and_activates_first() {
        let mut store = ThreadStore::new();
        let id = store
            .upsert_from_server(&json!({ "ChatID": "t1", "Messages": [] }), None)
            .unwrap();
        assert_eq!(id, "t1");
        assert_eq!(store.active_thread_id(), Some("t1"));

        store
            .upsert_from_server(&json!({ "ChatID": "t2", "Messages": [] }), None)
            .unwrap();
        // second upsert appends but does not steal the active selection
        assert_eq!(store.active_thread_id(), Some("t1"));
        assert_eq!(store.threads().len(), 2);
    }

    #[test]
    fn test_upsert_replaces_in_place_preserving_order() {
        let mut store = store_with(&[
            json!({ "ChatID": "a", "Messages": [] }),
            json!({ "ChatID": "b", "Messages": [] }),
            json!({ "ChatID": "c", "Messages": [] }),
        ]);

        store
            .upsert_from_server(
                &json!({ "ChatID": "b", "Messages": [["assistant", "updated"]] }),
                None,
            )
            .unwrap();

        let ids: Vec<&str> = store.threads().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(store.get("b").unwrap().summary, "updated");
    }

    #[test]
    fn test_upsert_uses_fallback_id() {
        let mut store = ThreadStore::new();
        let id = store
            .upsert_from_server(&json!({ "Messages": [] }), Some("fallback-9"))
            .unwrap();
        assert_eq!(id, "fallback-9");
        assert!(store.get("fallback-9").is_some());
    }

    #[test]
    fn test_upsert_unusable_payload_is_noop() {
        let mut store = ThreadStore::new();
        assert!(store.upsert_from_server(&json!(null), None).is_none());
        assert!(store.upsert_from_server(&json!({}), None).is_none());
        assert!(store.is_empty());
        assert_eq!(store.active_thread_id(), None);
    }

    #[test]
    fn test_upserted_thread_has_no_empty_messages() {
        let mut store = ThreadStore::new();
        store
            .upsert_from_server(
                &json!({
                    "ChatID": "t",
                    "Messages": [["user", "  "], ["assistant", "kept"], [null, null]],
                }),
                None,
            )
            .unwrap();
        let thread = store.get("t").unwrap();
        assert_eq!(thread.messages.len(), 1);
        assert!(thread.messages.iter().all(|m| !m.content.trim().is_empty()));
        assert_eq!(thread.summary, "kept");
    }

    #[test]
    fn test_append_then_rollback_restores_messages() {
        let mut store = store_with(&[json!({
            "ChatID": "t",
            "Messages": [["assistant", "hello"]],
        })]);
        let original = store.get("t").unwrap().messages.clone();
        let original_summary = store.get("t").unwrap().summary.clone();

        let message = Message::optimistic_user("What is entropy?");
        let optimistic_id = message.optimistic_id.clone().unwrap();
        store.append_optimistic("t", message);

        assert_eq!(store.get("t").unwrap().messages.len(), 2);
        assert_eq!(store.get("t").unwrap().summary, "What is entropy?");

        store.rollback_optimistic("t", &optimistic_id);
        assert_eq!(store.get("t").unwrap().messages, original);
        assert_eq!(store.get("t").unwrap().summary, original_summary);
    }

    #[test]
    fn test_rollback_is_idempotent() {
        let mut store = store_with(&[json!({ "ChatID": "t", "Messages": [] })]);
        store.append_optimistic("t", Message::optimistic_user("q"));
        let id = store.get("t").unwrap().messages[0]
            .optimistic_id
            .clone()
            .unwrap();

        store.rollback_optimistic("t", &id);
        store.rollback_optimistic("t", &id);
        store.rollback_optimistic("missing-thread", &id);
        assert!(store.get("t").unwrap().messages.is_empty());
        assert_eq!(store.get("t").unwrap().summary, EMPTY_PREVIEW);
    }

    #[test]
    fn test_rollback_targets_named_thread_only() {
        let mut store = store_with(&[
            json!({ "ChatID": "a", "Messages": [] }),
            json!({ "ChatID": "b", "Messages": [] }),
        ]);
        let message = Message::optimistic_user("shared content");
        let id = message.optimistic_id.clone().unwrap();
        store.append_optimistic("a", message.clone());
        store.append_optimistic("b", message);

        store.rollback_optimistic("a", &id);
        assert!(store.get("a").unwrap().messages.is_empty());
        assert_eq!(store.get("b").unwrap().messages.len(), 1);
    }

    #[test]
    fn test_append_to_missing_thread_is_noop() {
        let mut store = ThreadStore::new();
        store.append_optimistic("ghost", Message::optimistic_user("q"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_active_does_not_validate() {
        let mut store = ThreadStore::new();
        store.set_active(Some("not-yet-fetched"));
        assert_eq!(store.active_thread_id(), Some("not-yet-fetched"));
        assert!(store.active_thread().is_none());
        assert!(store.active_messages().is_empty());
    }

    #[test]
    fn test_replace_all_moves_selection_when_gone() {
        let mut store = store_with(&[json!({ "ChatID": "old", "Messages": [] })]);
        let incoming = vec![
            Thread::from_raw(&json!({ "ChatID": "n1", "Messages": [] }), 0).unwrap(),
            Thread::from_raw(&json!({ "ChatID": "n2", "Messages": [] }), 1).unwrap(),
        ];
        store.replace_all(incoming);
        assert_eq!(store.active_thread_id(), Some("n1"));

        store.set_active(Some("n2"));
        let kept = vec![Thread::from_raw(&json!({ "ChatID": "n2", "Messages": [] }), 0).unwrap()];
        store.replace_all(kept);
        assert_eq!(store.active_thread_id(), Some("n2"));

        store.replace_all(Vec::new());
        assert_eq!(store.active_thread_id(), None);
    }
}
