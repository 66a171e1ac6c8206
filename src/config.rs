//! Configuration for the trainer engine
//!
//! Provides centralized configuration for the API client, persistence
//! and audio I/O.

use std::path::PathBuf;
use std::time::Duration;

/// Fixed port the speech service listens on
pub const API_PORT: u16 = 3000;

/// Client-side timeout applied to every remote call
pub const API_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable overriding the development host
pub const API_HOST_ENV: &str = "SPRACHTRAINER_API_HOST";

/// Remote speech service endpoint settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    /// Development host override; loopback hosts are ignored in favor
    /// of the platform default
    pub host: Option<String>,
    pub port: u16,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: API_PORT,
            timeout: API_TIMEOUT,
        }
    }
}

/// Configuration for the complete trainer
#[derive(Clone, Debug)]
pub struct TrainerConfig {
    /// Remote API settings
    pub api: ApiConfig,

    /// Session document location; `None` uses the platform data dir
    pub storage_path: Option<PathBuf>,

    /// Whether to enable microphone capture
    pub enable_audio_input: bool,

    /// Whether to enable reply playback
    pub enable_audio_output: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage_path: None,
            enable_audio_input: true,
            enable_audio_output: true,
        }
    }
}

impl TrainerConfig {
    /// Point the API client at a specific development host
    pub fn with_api_host(mut self, host: impl Into<String>) -> Self {
        self.api.host = Some(host.into());
        self
    }

    /// Store the session document at an explicit path
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Disable microphone capture (text-only mode)
    pub fn without_audio_input(mut self) -> Self {
        self.enable_audio_input = false;
        self
    }

    /// Disable reply playback
    pub fn without_audio_output(mut self) -> Self {
        self.enable_audio_output = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api.port == 0 {
            return Err("API port must be non-zero".to_string());
        }
        if self.api.timeout.is_zero() {
            return Err("API timeout must be non-zero".to_string());
        }
        if let Some(host) = &self.api.host {
            if host.trim().is_empty() {
                return Err("API host override must not be empty".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainerConfig::default();
        assert!(config.enable_audio_input);
        assert!(config.enable_audio_output);
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.api.timeout, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = TrainerConfig::default()
            .with_api_host("192.168.1.20")
            .without_audio_input()
            .without_audio_output();

        assert_eq!(config.api.host.as_deref(), Some("192.168.1.20"));
        assert!(!config.enable_audio_input);
        assert!(!config.enable_audio_output);
    }

    #[test]
    fn test_validation_rejects_blank_host() {
        let config = TrainerConfig::default().with_api_host("  ");
        assert!(config.validate().is_err());

        let mut config = TrainerConfig::default();
        config.api.port = 0;
        assert!(config.validate().is_err());
    }
}
