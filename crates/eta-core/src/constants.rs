//! Application-wide constants
//!
//! Centralized location for magic strings and configuration values
//! that are used across multiple modules.

use std::time::Duration;

/// Maximum length of a thread summary preview, in characters.
pub const MESSAGE_PREVIEW_LIMIT: usize = 140;

/// Sentinel summary for threads with no usable messages.
pub const EMPTY_PREVIEW: &str = "No messages yet.";

/// Title fallback is "Session {index+1}"; see `Thread::from_raw`.
pub const SESSION_TITLE_PREFIX: &str = "Session";

/// How long the avatar keeps "speaking" after a chat reply resolves.
pub const SPEAKING_GRACE: Duration = Duration::from_secs(2);

/// Animation hint used when voice playback drives the speaking signal.
pub const DEFAULT_ANIMATION: &str = "talking";

/// Prompt sent for practice-problem generation when the composer is empty.
pub const DEFAULT_PRACTICE_PROMPT: &str =
    "Create a short set of practice problems based on our current session.";

/// Assistant message appended to a thread after a voice reply arrives.
pub const VOICE_DELIVERED_MESSAGE: &str = "\u{1f50a} Voice response delivered.";

/// Expanded message shown when a voice reply is ready to play.
pub const VOICE_READY_MESSAGE: &str = "Voice ready. Press play below to listen.";

/// Assistant message shown after a successful context upload.
pub const UPLOAD_CONFIRMATION: &str =
    "Context uploaded successfully. Future responses will incorporate the new material.";

/// Notice shown when a thread could not be created for an action.
pub const THREAD_UNAVAILABLE_NOTICE: &str =
    "Unable to start a new session. Please try again in a moment.";
