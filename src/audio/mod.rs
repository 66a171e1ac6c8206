//! Audio capture and playback seams
//!
//! The orchestrator only sees the [`Recorder`] and [`Player`] traits;
//! the cpal/rodio implementations live behind the `audio-io` feature so
//! the engine builds and tests on machines without sound hardware.

#[cfg(feature = "audio-io")]
pub mod playback;
#[cfg(feature = "audio-io")]
pub mod recorder;

#[cfg(feature = "audio-io")]
pub use playback::RodioPlayer;
#[cfg(feature = "audio-io")]
pub use recorder::MicRecorder;

use crate::{Result, TrainerError};
use std::io::Cursor;

/// A captured or synthesized audio payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl AudioClip {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Encode mono f32 samples as a 16-bit WAV clip ready for upload
    pub fn wav(samples: &[f32], sample_rate: u32) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| TrainerError::Recording(format!("WAV encode failed: {e}")))?;
            for &sample in samples {
                let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer
                    .write_sample(value)
                    .map_err(|e| TrainerError::Recording(format!("WAV encode failed: {e}")))?;
            }
            writer
                .finalize()
                .map_err(|e| TrainerError::Recording(format!("WAV encode failed: {e}")))?;
        }
        Ok(Self::new(cursor.into_inner(), "audio/wav", "audio.wav"))
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Microphone capture for one utterance at a time
pub trait Recorder {
    /// Acquire the microphone and start capturing. Permission or device
    /// failures are reported here, before any state changes.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing and hand back the recorded clip
    fn stop(&mut self) -> Result<AudioClip>;

    /// Best-effort stop that discards the capture
    fn cancel(&mut self);

    fn is_recording(&self) -> bool;
}

/// Exclusive reply playback: starting a clip must tear down whatever
/// was playing before it
pub trait Player {
    fn play(&mut self, clip: AudioClip) -> Result<()>;

    /// Stop and release the current clip, if any
    fn stop(&mut self);

    fn is_playing(&self) -> bool;
}
