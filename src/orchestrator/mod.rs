//! Turn orchestrator
//!
//! Sequences one conversational exchange: press-in starts microphone
//! capture, press-out uploads the utterance for transcription, requests
//! the coached reply over the full ordered history and plays the
//! synthesized answer. At most one turn is in flight; the phase field is
//! the single authority on what the orchestrator is doing.

use crate::api::SpeechApi;
use crate::audio::{AudioClip, Player, Recorder};
use crate::session::reward;
use crate::session::store::SessionStore;
use crate::session::types::{Message, Role, SessionReward};
use crate::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where the current turn stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No turn in flight
    Idle,
    /// Microphone capture is running
    Recording,
    /// Captured audio is being uploaded for transcription
    Transcribing,
    /// Waiting for the coached reply
    AwaitingReply,
    /// Reply received, synthesized audio starting
    Speaking,
}

/// Events emitted for the UI layer
#[derive(Debug, Clone)]
pub enum TurnEvent {
    RecordingStarted,
    RecordingStopped,
    RecordingCancelled,
    /// Transcription result for the user's utterance
    Transcribed(String),
    /// Coached reply appended to the history
    ReplyReceived { reply: String, has_audio: bool },
    PlaybackStarted,
    /// Session finalized, one-shot reward stored
    SessionCompleted(SessionReward),
    /// User-facing message for the conversation alert
    Error(String),
}

/// Drives the record → transcribe → reply → speak cycle against the
/// session store
pub struct TurnOrchestrator<A, R, P> {
    api: A,
    recorder: R,
    player: P,
    store: SessionStore,
    phase: TurnPhase,
    session_started_at: Instant,
    event_tx: Sender<TurnEvent>,
    event_rx: Receiver<TurnEvent>,
}

impl<A, R, P> TurnOrchestrator<A, R, P>
where
    A: SpeechApi,
    R: Recorder,
    P: Player,
{
    pub fn new(api: A, recorder: R, player: P, store: SessionStore) -> Self {
        let (event_tx, event_rx) = bounded(100);
        Self {
            api,
            recorder,
            player,
            store,
            phase: TurnPhase::Idle,
            session_started_at: Instant::now(),
            event_tx,
            event_rx,
        }
    }

    /// Receiver for UI-facing events
    pub fn events(&self) -> Receiver<TurnEvent> {
        self.event_rx.clone()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Whether a turn is in flight
    pub fn is_busy(&self) -> bool {
        self.phase != TurnPhase::Idle
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    fn emit(&self, event: TurnEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Press-in: acquire the microphone and start capturing. Ignored
    /// while a turn is already in flight; an acquisition failure leaves
    /// no side effects behind.
    pub fn press_in(&mut self) -> Result<()> {
        if self.phase != TurnPhase::Idle {
            debug!(phase = ?self.phase, "Press-in ignored, turn in flight");
            return Ok(());
        }
        match self.recorder.start() {
            Ok(()) => {
                self.phase = TurnPhase::Recording;
                self.emit(TurnEvent::RecordingStarted);
                Ok(())
            }
            Err(e) => {
                warn!("Microphone acquisition failed: {e}");
                self.emit(TurnEvent::Error(e.user_message()));
                Err(e)
            }
        }
    }

    /// Press-out: run the rest of the turn. A press-out without an
    /// active recording is a no-op. Any failure aborts the turn back to
    /// idle and surfaces a single user-facing error.
    pub async fn press_out(&mut self) -> Result<()> {
        if self.phase != TurnPhase::Recording {
            debug!(phase = ?self.phase, "Press-out ignored, not recording");
            return Ok(());
        }
        match self.run_turn().await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Turn aborted: {e}");
                self.phase = TurnPhase::Idle;
                self.emit(TurnEvent::Error(e.user_message()));
                Err(e)
            }
        }
    }

    async fn run_turn(&mut self) -> Result<()> {
        self.phase = TurnPhase::Transcribing;
        self.emit(TurnEvent::RecordingStopped);
        let clip = self.recorder.stop()?;

        let stt = self.api.transcribe(&clip).await?;
        self.emit(TurnEvent::Transcribed(stt.text.clone()));

        // Resolve scope/level/name once; the rest of the turn threads it
        let ctx = self.store.resolve_context();
        self.store
            .append_message(ctx.scope, Message::new(Role::User, stt.text));

        self.phase = TurnPhase::AwaitingReply;
        // The history sent along already contains the user message
        let history = self.store.history(ctx.scope);
        let response = self
            .api
            .chat_reply(ctx.level, &history, &ctx.user, ctx.lang)
            .await?;

        self.store
            .append_message(ctx.scope, Message::new(Role::Assistant, response.reply.clone()));
        self.phase = TurnPhase::Speaking;
        self.emit(TurnEvent::ReplyReceived {
            reply: response.reply,
            has_audio: response.audio.is_some(),
        });

        if let Some(audio) = response.audio {
            debug!(
                approx_bytes = audio.approx_bytes(),
                mime = %audio.mime_type,
                "Reply carries synthesized audio"
            );
            // Playback failure is non-fatal; the reply stays as text
            match audio.decode() {
                Ok(bytes) => {
                    let clip = AudioClip::new(bytes, audio.mime_type, "reply");
                    match self.player.play(clip) {
                        Ok(()) => self.emit(TurnEvent::PlaybackStarted),
                        Err(e) => warn!("Reply playback failed: {e}"),
                    }
                }
                Err(e) => warn!("Reply audio undecodable: {e}"),
            }
        } else {
            debug!("No audio in reply");
        }

        self.phase = TurnPhase::Idle;
        Ok(())
    }

    /// Finalize the session: stop any capture and playback, credit the
    /// reward, clear the scoped history and restart the session clock.
    pub fn finish_session(&mut self) -> SessionReward {
        self.stop_media();

        let ctx = self.store.resolve_context();
        let history = self.store.history(ctx.scope);
        let stats = reward::summarize(self.session_started_at.elapsed(), &history);

        self.store.ensure_language_profile(ctx.lang);
        let reward = self.store.complete_session(ctx.lang, &stats);
        self.store.reset_history(ctx.scope);

        self.session_started_at = Instant::now();
        self.phase = TurnPhase::Idle;
        info!(
            lang = ctx.lang.as_str(),
            xp_earned = reward.xp_earned,
            streak = reward.streak_after,
            "Session completed"
        );
        self.emit(TurnEvent::SessionCompleted(reward.clone()));
        reward
    }

    /// Leave-screen path: cancel whatever is in flight. Not an error.
    pub fn cancel(&mut self) {
        let was_recording = self.phase == TurnPhase::Recording;
        self.stop_media();
        self.phase = TurnPhase::Idle;
        if was_recording {
            self.emit(TurnEvent::RecordingCancelled);
        }
    }

    /// Restart the session clock, e.g. when the conversation view
    /// reappears with an empty history
    pub fn reset_session_clock(&mut self) {
        self.session_started_at = Instant::now();
    }

    fn stop_media(&mut self) {
        self.recorder.cancel();
        self.player.stop();
    }
}
