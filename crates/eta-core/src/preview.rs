//! Bounded display previews for thread summaries.

use crate::constants::{EMPTY_PREVIEW, MESSAGE_PREVIEW_LIMIT};

/// Collapse whitespace runs and bound the result to
/// [`MESSAGE_PREVIEW_LIMIT`] characters, appending an ellipsis when the
/// text was truncated. Empty or whitespace-only input yields the
/// [`EMPTY_PREVIEW`] sentinel.
pub fn format_message_preview(text: &str) -> String {
    let clean = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if clean.is_empty() {
        return EMPTY_PREVIEW.to_string();
    }
    if clean.chars().count() > MESSAGE_PREVIEW_LIMIT {
        let mut out: String = clean.chars().take(MESSAGE_PREVIEW_LIMIT - 1).collect();
        out.push('\u{2026}');
        out
    } else {
        clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_sentinel() {
        assert_eq!(format_message_preview(""), EMPTY_PREVIEW);
        assert_eq!(format_message_preview("   \n\t  "), EMPTY_PREVIEW);
    }

    #[test]
    fn test_whitespace_collapsed_and_trimmed() {
        assert_eq!(
            format_message_preview("  hello\n\n  world\t again "),
            "hello world again"
        );
    }

    #[test]
    fn test_short_input_unchanged() {
        let text = "Entropy measures disorder.";
        assert_eq!(format_message_preview(text), text);
    }

    #[test]
    fn test_exactly_at_limit_unchanged() {
        let text = "a".repeat(MESSAGE_PREVIEW_LIMIT);
        assert_eq!(format_message_preview(&text), text);
    }

    #[test]
    fn test_over_limit_truncated_with_ellipsis() {
        let text = "b".repeat(MESSAGE_PREVIEW_LIMIT + 50);
        let preview = format_message_preview(&text);
        assert_eq!(preview.chars().count(), MESSAGE_PREVIEW_LIMIT);
        assert!(preview.ends_with('\u{2026}'));
        assert!(preview.starts_with(&"b".repeat(MESSAGE_PREVIEW_LIMIT - 1)));
    }

    #[test]
    fn test_limit_applies_after_collapse() {
        // 150 chars of padding collapse down to well under the limit
        let text = format!("start{}end", " ".repeat(150));
        assert_eq!(format_message_preview(&text), "start end");
    }

    #[test]
    fn test_multibyte_input_counts_characters() {
        let text = "\u{00e9}".repeat(MESSAGE_PREVIEW_LIMIT + 1);
        let preview = format_message_preview(&text);
        assert_eq!(preview.chars().count(), MESSAGE_PREVIEW_LIMIT);
        assert!(preview.ends_with('\u{2026}'));
    }
}
