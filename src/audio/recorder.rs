use super::{AudioClip, Recorder};
use crate::{Result, TrainerError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Push-to-talk microphone capture via the default input device.
/// Samples accumulate while the stream is live; `stop` encodes them as
/// a WAV clip for upload.
pub struct MicRecorder {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    is_recording: Arc<Mutex<bool>>,
    buffer: Arc<Mutex<Vec<f32>>>,
}

impl MicRecorder {
    /// Create a recorder on the default input device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| TrainerError::AudioDevice("No input device available".into()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_input_config()
            .map_err(|e| TrainerError::AudioDevice(format!("Failed to get input config: {e}")))?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            is_recording: Arc::new(Mutex::new(false)),
            buffer: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }
}

impl Recorder for MicRecorder {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            warn!("Already recording");
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let is_recording = Arc::clone(&self.is_recording);
        let buffer = Arc::clone(&self.buffer);
        buffer.lock().clear();

        let err_fn = |err| {
            error!("Audio input stream error: {}", err);
        };

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !*is_recording.lock() {
                        return;
                    }

                    // Average all channels down to mono
                    let samples: Vec<f32> = if channels == 1 {
                        data.to_vec()
                    } else {
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                            .collect()
                    };
                    buffer.lock().extend_from_slice(&samples);
                },
                err_fn,
                None,
            )
            .map_err(|e| TrainerError::AudioDevice(format!("Failed to build input stream: {e}")))?;

        stream
            .play()
            .map_err(|e| TrainerError::AudioDevice(format!("Failed to start input stream: {e}")))?;

        *self.is_recording.lock() = true;
        self.stream = Some(stream);
        debug!("Recording started at {} Hz", self.sample_rate());
        Ok(())
    }

    fn stop(&mut self) -> Result<AudioClip> {
        *self.is_recording.lock() = false;
        // Dropping the stream releases the device
        self.stream.take();

        let samples = std::mem::take(&mut *self.buffer.lock());
        debug!("Recording stopped, captured {} samples", samples.len());
        if samples.is_empty() {
            return Err(TrainerError::Recording("No audio captured".into()));
        }
        AudioClip::wav(&samples, self.sample_rate())
    }

    fn cancel(&mut self) {
        *self.is_recording.lock() = false;
        self.stream.take();
        self.buffer.lock().clear();
        debug!("Recording cancelled");
    }

    fn is_recording(&self) -> bool {
        self.stream.is_some()
    }
}
