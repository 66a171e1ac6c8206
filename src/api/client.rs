//! HTTP client for the remote speech service
//!
//! Two endpoints are consumed: multipart `POST /stt` for transcription
//! and JSON `POST /chat` for the coached reply (optionally carrying
//! synthesized audio). A single fixed timeout applies to both.

use super::types::{
    ApiDebugInfo, ChatPayload, ChatRequest, ChatResponse, ErrorBody, ReplyAudio, SttPayload,
    SttResponse, WireMessage,
};
use super::SpeechApi;
use crate::audio::AudioClip;
use crate::config::{ApiConfig, API_HOST_ENV};
use crate::session::types::{LanguageCode, Level, Message};
use crate::{Result, TrainerError};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::env;
use tracing::{debug, warn};

const STT_ENGINE_HEADER: &str = "x-stt-engine";
const CHAT_ENGINE_HEADER: &str = "x-chat-engine";
const TRACE_HEADER: &str = "x-debug-id";
const STT_DEBUG_HEADERS: &[&str] = &["x-debug-stt-duration", "x-debug-stt-bytes"];
const CHAT_DEBUG_HEADERS: &[&str] = &["x-tts-trace", "x-mock-tts", "x-debug-tts-bytes"];

fn is_loopback_host(host: &str) -> bool {
    host == "localhost" || host == "127.0.0.1"
}

fn platform_loopback() -> &'static str {
    // The Android emulator reaches the host machine via 10.0.2.2
    if cfg!(target_os = "android") {
        "10.0.2.2"
    } else {
        "localhost"
    }
}

/// Resolve the service base URL: configured dev host, then the
/// environment override, then the platform loopback, always on the
/// fixed service port
pub fn resolve_base_url(config: &ApiConfig) -> String {
    let env_host = env::var(API_HOST_ENV).ok();
    let host = [config.host.as_deref(), env_host.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|h| !h.is_empty() && !is_loopback_host(h))
        .map(str::to_string)
        .unwrap_or_else(|| platform_loopback().to_string());
    format!("http://{host}:{}", config.port)
}

fn get_header(headers: &HeaderMap, key: &str) -> Option<String> {
    headers
        .get(key)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn pick_headers(headers: &HeaderMap, keys: &[&str]) -> BTreeMap<String, String> {
    keys.iter()
        .filter_map(|key| get_header(headers, key).map(|value| (key.to_string(), value)))
        .collect()
}

/// Collect trace/engine details from response headers and the payload's
/// `debug` object; `None` when there is nothing worth keeping
fn build_debug_info(
    headers: &HeaderMap,
    meta: Option<Map<String, Value>>,
    engine_header: &str,
    extra_headers: &[&str],
) -> Option<ApiDebugInfo> {
    let mut keys = vec![TRACE_HEADER, engine_header];
    keys.extend_from_slice(extra_headers);
    let header_entries = pick_headers(headers, &keys);

    let meta_trace = meta
        .as_ref()
        .and_then(|m| m.get("traceId"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let info = ApiDebugInfo {
        trace_id: get_header(headers, TRACE_HEADER).or(meta_trace),
        engine: get_header(headers, engine_header),
        meta: meta.filter(|m| !m.is_empty()),
        headers: (!header_entries.is_empty()).then_some(header_entries),
    };
    (!info.is_empty()).then_some(info)
}

/// Map a transport-level failure, keeping timeouts distinguishable
fn map_request_error(err: reqwest::Error) -> TrainerError {
    if err.is_timeout() {
        TrainerError::Timeout
    } else {
        TrainerError::Network(err.to_string())
    }
}

/// Extract the server-supplied `message` field from an error body
fn parse_error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}

/// Fail non-2xx responses, preferring the server's own message over a
/// generic status line
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    match parse_error_message(&body) {
        Some(message) => Err(TrainerError::Server(message)),
        None => Err(TrainerError::HttpStatus(status.as_u16())),
    }
}

/// Reqwest-backed client for the speech service
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TrainerError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: resolve_base_url(config),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SpeechApi for ApiClient {
    async fn transcribe(&self, clip: &AudioClip) -> Result<SttResponse> {
        let part = Part::bytes(clip.data.clone())
            .file_name(clip.file_name.clone())
            .mime_str(&clip.mime_type)
            .map_err(|e| TrainerError::Config(format!("Invalid clip mime type: {e}")))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/stt", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(map_request_error)?;
        let response = check_status(response).await?;
        let headers = response.headers().clone();
        let payload: SttPayload = response
            .json()
            .await
            .map_err(|e| TrainerError::InvalidResponse(format!("Bad STT response: {e}")))?;

        let text = payload.text.trim().to_string();
        if text.is_empty() {
            return Err(TrainerError::EmptyTranscription);
        }
        if text.starts_with("[mock]") {
            return Err(TrainerError::Server(
                "STT ist im Mock-Modus (kein OPENAI_API_KEY auf dem Server)".to_string(),
            ));
        }
        let debug_info =
            build_debug_info(&headers, payload.debug, STT_ENGINE_HEADER, STT_DEBUG_HEADERS);
        debug!(trace_id = ?debug_info.as_ref().and_then(|d| d.trace_id.as_deref()), "STT ok");
        Ok(SttResponse {
            text,
            debug: debug_info,
        })
    }

    async fn chat_reply(
        &self,
        level: Level,
        history: &[Message],
        user: &str,
        target_lang: LanguageCode,
    ) -> Result<ChatResponse> {
        let request = ChatRequest {
            level,
            history: history.iter().map(WireMessage::from).collect(),
            user: user.to_string(),
            target_lang,
        };

        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(map_request_error)?;
        let response = check_status(response).await?;
        let headers = response.headers().clone();
        let payload: ChatPayload = response
            .json()
            .await
            .map_err(|e| TrainerError::InvalidResponse(format!("Bad chat response: {e}")))?;

        if payload.reply.is_empty() {
            return Err(TrainerError::InvalidResponse(
                "Empty chat response".to_string(),
            ));
        }

        let audio = match (payload.audio, payload.audio_mime_type) {
            (Some(data), Some(mime_type)) => Some(ReplyAudio { data, mime_type }),
            (None, None) => None,
            (data, mime) => {
                warn!(
                    has_data = data.is_some(),
                    has_mime = mime.is_some(),
                    "Reply audio is incomplete, playing nothing"
                );
                None
            }
        };

        let mut debug_info =
            build_debug_info(&headers, payload.debug, CHAT_ENGINE_HEADER, CHAT_DEBUG_HEADERS);
        if let Some(info) = debug_info.as_mut() {
            if let Some(meta) = info.meta.as_mut() {
                // Backfill the TTS trace from the header when the payload lacks it
                if !meta.get("ttsTraceId").is_some_and(Value::is_string) {
                    if let Some(tts_trace) = get_header(&headers, "x-tts-trace") {
                        meta.insert("ttsTraceId".to_string(), Value::String(tts_trace));
                    }
                }
            }
        }
        Ok(ChatResponse {
            reply: payload.reply,
            audio,
            debug: debug_info,
        })
    }
}
