use super::{AudioClip, Player};
use crate::{Result, TrainerError};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;
use tracing::debug;

/// Reply playback through the default output device. At most one clip
/// plays at a time; starting a new one stops and releases the previous
/// sink first.
pub struct RodioPlayer {
    output: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
}

impl RodioPlayer {
    pub fn new() -> Self {
        Self {
            output: None,
            sink: None,
        }
    }
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for RodioPlayer {
    fn play(&mut self, clip: AudioClip) -> Result<()> {
        self.stop();

        // The output stream is opened lazily and kept for the screen's lifetime
        if self.output.is_none() {
            let output = OutputStream::try_default()
                .map_err(|e| TrainerError::AudioDevice(format!("No output device: {e}")))?;
            self.output = Some(output);
        }
        let Some((_, handle)) = self.output.as_ref() else {
            return Err(TrainerError::AudioDevice("No output device".into()));
        };

        let source = Decoder::new(Cursor::new(clip.data))
            .map_err(|e| TrainerError::Playback(format!("Undecodable reply audio: {e}")))?;
        let sink = Sink::try_new(handle)
            .map_err(|e| TrainerError::Playback(format!("Failed to open sink: {e}")))?;
        sink.append(source);
        debug!(mime = %clip.mime_type, "Playback started");
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
            debug!("Playback stopped");
        }
    }

    fn is_playing(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| !sink.empty())
    }
}
