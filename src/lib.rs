pub mod api;
pub mod audio;
pub mod config;
pub mod orchestrator;
pub mod session;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum TrainerError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Microphone permission denied")]
    MicPermissionDenied,

    #[error("Recording error: {0}")]
    Recording(String),

    #[error("Request timed out")]
    Timeout,

    #[error("{0}")]
    Server(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty transcription")]
    EmptyTranscription,

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for TrainerError {
    fn from(e: std::io::Error) -> Self {
        TrainerError::Storage(e.to_string())
    }
}

impl TrainerError {
    /// Check if this error is recoverable by simply retrying the turn
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Hardware/device errors may require user intervention
            TrainerError::AudioDevice(_) => false,
            TrainerError::MicPermissionDenied => false,
            TrainerError::Recording(_) => true,
            // Remote API errors are typically transient
            TrainerError::Timeout => true,
            TrainerError::Server(_) => true,
            TrainerError::HttpStatus(_) => true,
            TrainerError::Network(_) => true,
            TrainerError::InvalidResponse(_) => true,
            TrainerError::EmptyTranscription => true,
            TrainerError::Playback(_) => true,
            TrainerError::Storage(_) => false,
            TrainerError::Config(_) => false,
        }
    }

    /// Get a user-friendly description for the conversation alert
    pub fn user_message(&self) -> String {
        match self {
            TrainerError::AudioDevice(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            TrainerError::MicPermissionDenied => "Microphone permission denied".to_string(),
            TrainerError::Recording(_) => "Recording failed. Please try again.".to_string(),
            TrainerError::Timeout => "Request timed out".to_string(),
            TrainerError::Server(message) => message.clone(),
            TrainerError::HttpStatus(status) => format!("HTTP {}", status),
            TrainerError::Network(_) => "Network error".to_string(),
            TrainerError::InvalidResponse(message) => message.clone(),
            TrainerError::EmptyTranscription => {
                "The transcription was empty. Please try again.".to_string()
            }
            TrainerError::Playback(_) => {
                "Audio playback failed. Response is shown as text.".to_string()
            }
            TrainerError::Storage(_) => "File system error occurred.".to_string(),
            TrainerError::Config(_) => "Configuration error. Please check settings.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrainerError>;
