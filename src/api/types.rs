//! Wire types for the remote speech service

use crate::session::types::{LanguageCode, Level, Message, Role};
use crate::{Result, TrainerError};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Trace/engine details surfaced by the service for debugging
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDebugInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

impl ApiDebugInfo {
    pub fn is_empty(&self) -> bool {
        self.trace_id.is_none()
            && self.engine.is_none()
            && self.meta.as_ref().map_or(true, Map::is_empty)
            && self.headers.as_ref().map_or(true, BTreeMap::is_empty)
    }
}

/// Synthesized reply audio as delivered by the chat endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyAudio {
    /// Base64-encoded audio bytes
    pub data: String,
    pub mime_type: String,
}

impl ReplyAudio {
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64_STANDARD
            .decode(&self.data)
            .map_err(|e| TrainerError::InvalidResponse(format!("Bad reply audio: {e}")))
    }

    /// Rough decoded size without actually decoding
    pub fn approx_bytes(&self) -> usize {
        (self.data.len() as f64 * 0.75).ceil() as usize
    }
}

/// Result of `POST /stt`
#[derive(Debug, Clone, PartialEq)]
pub struct SttResponse {
    pub text: String,
    pub debug: Option<ApiDebugInfo>,
}

/// Result of `POST /chat`
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub reply: String,
    pub audio: Option<ReplyAudio>,
    pub debug: Option<ApiDebugInfo>,
}

/// History entry as the chat endpoint expects it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub level: Level,
    pub history: Vec<WireMessage>,
    pub user: String,
    pub target_lang: LanguageCode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SttPayload {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub debug: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatPayload {
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub audio_mime_type: Option<String>,
    #[serde(default)]
    pub debug: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serializes_with_expected_keys() {
        let request = ChatRequest {
            level: Level::Beginner,
            history: vec![WireMessage {
                role: Role::User,
                content: "Hallo".to_string(),
            }],
            user: "Alex Muster".to_string(),
            target_lang: LanguageCode::De,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["level"], "beginner");
        assert_eq!(value["targetLang"], "de");
        assert_eq!(value["user"], "Alex Muster");
        assert_eq!(value["history"][0]["role"], "user");
        assert_eq!(value["history"][0]["content"], "Hallo");
        // nothing but the documented fields goes on the wire
        assert_eq!(value.as_object().unwrap().len(), 4);
        assert_eq!(value["history"][0].as_object().unwrap().len(), 2);
    }

    #[test]
    fn reply_audio_decodes_base64() {
        let audio = ReplyAudio {
            data: BASE64_STANDARD.encode(b"RIFFdata"),
            mime_type: "audio/wav".to_string(),
        };
        assert_eq!(audio.decode().unwrap(), b"RIFFdata");
        // ceil(12 base64 chars * 0.75): the estimate counts padding
        assert_eq!(audio.approx_bytes(), 9);

        let bad = ReplyAudio {
            data: "not base64 !!".to_string(),
            mime_type: "audio/wav".to_string(),
        };
        assert!(bad.decode().is_err());
    }
}
