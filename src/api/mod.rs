//! Remote speech service client
//!
//! The speech-to-text, chat-reply and text-to-speech endpoints are
//! external collaborators reached over HTTP; nothing here implements
//! them. [`SpeechApi`] is the seam the orchestrator talks through so
//! tests can substitute a scripted service.

pub mod client;
pub mod types;

pub use client::{resolve_base_url, ApiClient};
pub use types::{ApiDebugInfo, ChatRequest, ChatResponse, ReplyAudio, SttResponse, WireMessage};

use crate::audio::AudioClip;
use crate::session::types::{LanguageCode, Level, Message};
use crate::Result;
use async_trait::async_trait;

/// Remote endpoints consumed during one conversation turn
#[async_trait]
pub trait SpeechApi: Send + Sync {
    /// Upload a captured clip for transcription
    async fn transcribe(&self, clip: &AudioClip) -> Result<SttResponse>;

    /// Request the coached reply for the full ordered history
    async fn chat_reply(
        &self,
        level: Level,
        history: &[Message],
        user: &str,
        target_lang: LanguageCode,
    ) -> Result<ChatResponse>;
}
