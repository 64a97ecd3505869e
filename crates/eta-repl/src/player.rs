//! Local audio playback for voice replies.
//!
//! Thin wrapper over rodio. Initialization failure is tolerated so the
//! REPL still works on machines without an audio device.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct AudioPlayer {
    // must stay alive for the sink to produce sound
    _stream: Option<OutputStream>,
    stream_handle: Option<OutputStreamHandle>,
    sink: Option<Sink>,
}

impl AudioPlayer {
    pub fn new() -> Self {
        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok((stream, handle)) => (Some(stream), Some(handle)),
            Err(err) => {
                tracing::warn!("audio output unavailable: {err}");
                (None, None)
            }
        };
        Self {
            _stream: stream,
            stream_handle,
            sink: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.stream_handle.is_some()
    }

    pub fn play(&mut self, path: &Path) -> Result<(), String> {
        let stream_handle = self
            .stream_handle
            .as_ref()
            .ok_or_else(|| "Audio output not available".to_string())?;

        let file = File::open(path).map_err(|e| format!("Failed to open audio file: {e}"))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| format!("Failed to decode audio file: {e}"))?;
        let sink = Sink::try_new(stream_handle)
            .map_err(|e| format!("Failed to create audio sink: {e}"))?;
        sink.append(source);

        self.sink = Some(sink);
        Ok(())
    }

    pub fn resume(&self) {
        if let Some(ref sink) = self.sink {
            sink.play();
        }
    }

    pub fn pause(&self) {
        if let Some(ref sink) = self.sink {
            sink.pause();
        }
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    /// Playback ran past the end of the source.
    pub fn finished(&self) -> bool {
        self.sink.as_ref().map(|sink| sink.empty()).unwrap_or(false)
    }

    /// A paused source is still loaded and can be resumed.
    pub fn has_source(&self) -> bool {
        self.sink.as_ref().map(|sink| !sink.empty()).unwrap_or(false)
    }
}

impl Default for AudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}
