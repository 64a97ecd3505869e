//! Derived speaking/animation signal for the avatar renderer.
//!
//! The signal is true while a chat reply is awaited, for a fixed grace
//! window after the reply resolves, or while a voice reply is playing.
//! The grace window is an owned deadline, cancelled whenever a new send
//! or a voice session supersedes it, so two windows never fight over
//! the signal. Queries take `now` so tests can inject time.

use std::time::Instant;

use crate::constants::{DEFAULT_ANIMATION, SPEAKING_GRACE};

#[derive(Debug, Default)]
pub struct SpeakingCoordinator {
    awaiting_reply: bool,
    grace_until: Option<Instant>,
    voice_active: bool,
    voice_animation: Option<String>,
}

impl SpeakingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chat reply is now in flight; any pending grace window from an
    /// earlier reply is superseded.
    pub fn begin_reply(&mut self) {
        self.awaiting_reply = true;
        self.grace_until = None;
    }

    /// The in-flight chat reply resolved (either way); hold the signal
    /// for the grace window.
    pub fn end_reply(&mut self, now: Instant) {
        self.awaiting_reply = false;
        self.grace_until = Some(now + SPEAKING_GRACE);
    }

    /// Voice playback started; it owns the signal until it stops.
    pub fn voice_started(&mut self, animation: &str) {
        self.grace_until = None;
        self.voice_active = true;
        self.voice_animation = Some(animation.to_string());
    }

    pub fn voice_stopped(&mut self) {
        self.voice_active = false;
        self.voice_animation = None;
    }

    /// Clear everything, including any pending grace window.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_speaking(&self, now: Instant) -> bool {
        self.awaiting_reply
            || self.voice_active
            || self.grace_until.is_some_and(|deadline| now < deadline)
    }

    /// Animation hint while voice playback drives the signal, defaulting
    /// to the generic talking clip.
    pub fn animation_hint(&self) -> Option<&str> {
        if self.voice_active {
            Some(self.voice_animation.as_deref().unwrap_or(DEFAULT_ANIMATION))
        } else {
            None
        }
    }
}
