//! Ephemeral voice reply resource and its playback state machine.
//!
//! A voice reply owns one audio file written under the data directory.
//! Exactly one instance may be live; superseding, closing, ending, or
//! teardown releases the file. Release is idempotent and best-effort:
//! a failed delete is never surfaced.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::DEFAULT_ANIMATION;

#[derive(Debug)]
pub struct VoiceReply {
    pub audio_path: PathBuf,
    pub animation: String,
    released: bool,
}

impl VoiceReply {
    /// Write `audio` to a fresh mp3 file under `data_dir` and take
    /// ownership of it. Written via temp-file-plus-rename so a partial
    /// write never looks playable.
    pub fn create(data_dir: &Path, audio: &[u8], animation: Option<&str>) -> Result<Self> {
        fs::create_dir_all(data_dir).context("Failed to create voice reply directory")?;

        let id = Uuid::new_v4();
        let audio_path = data_dir.join(format!("voice-{id}.mp3"));
        let temp_path = data_dir.join(format!(".voice-{id}.mp3.tmp"));

        fs::write(&temp_path, audio).context("Failed to write voice reply audio")?;
        fs::rename(&temp_path, &audio_path).context("Failed to move voice reply into place")?;

        debug!(path = %audio_path.display(), bytes = audio.len(), "voice reply stored");
        Ok(Self {
            audio_path,
            animation: animation.unwrap_or(DEFAULT_ANIMATION).to_string(),
            released: false,
        })
    }

    /// Delete the underlying audio file. Safe to call repeatedly; only
    /// the first call touches the filesystem.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = fs::remove_file(&self.audio_path) {
            warn!(path = %self.audio_path.display(), %err, "voice reply cleanup failed");
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for VoiceReply {
    fn drop(&mut self) {
        self.release();
    }
}

/// Playback lifecycle. `Speaking` is only reachable from `Ready`;
/// pausing returns to `Ready` without touching the resource; ending or
/// closing releases it.
#[derive(Debug, Default)]
pub enum VoicePlayback {
    #[default]
    Empty,
    Ready(VoiceReply),
    Speaking(VoiceReply),
}

impl VoicePlayback {
    pub fn is_empty(&self) -> bool {
        matches!(self, VoicePlayback::Empty)
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self, VoicePlayback::Speaking(_))
    }

    pub fn reply(&self) -> Option<&VoiceReply> {
        match self {
            VoicePlayback::Empty => None,
            VoicePlayback::Ready(reply) | VoicePlayback::Speaking(reply) => Some(reply),
        }
    }

    /// Install a new reply, releasing any prior instance first.
    pub fn replace(&mut self, reply: VoiceReply) {
        self.close();
        *self = VoicePlayback::Ready(reply);
    }

    /// `Ready -> Speaking`. Refused from `Empty` and a no-op while
    /// already speaking.
    pub fn play(&mut self) -> bool {
        match std::mem::take(self) {
            VoicePlayback::Ready(reply) => {
                *self = VoicePlayback::Speaking(reply);
                true
            }
            other => {
                *self = other;
                matches!(self, VoicePlayback::Speaking(_))
            }
        }
    }

    /// `Speaking -> Ready`, keeping the resource for resumption.
    pub fn pause(&mut self) {
        if let VoicePlayback::Speaking(reply) = std::mem::take(self) {
            *self = VoicePlayback::Ready(reply);
        }
    }

    /// Release the resource and return to `Empty`, from any state.
    pub fn close(&mut self) {
        if let VoicePlayback::Ready(mut reply) | VoicePlayback::Speaking(mut reply) =
            std::mem::take(self)
        {
            reply.release();
        }
    }
}
