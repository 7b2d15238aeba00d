//! Continuous capture controller.
//!
//! Turns a native recognizer that ends on its own (silence, timeouts) into a
//! logical recording that runs until the user stops or pauses it. The
//! controller is a synchronous state machine; the owner feeds it native
//! events and schedules the delayed resumes it asks for.
//!
//! ```text
//!              start()                 stop()/pause()
//!   Idle ─────────────────> Listening ───────────────> ManuallyStopping
//!    ^                        │   │                          │
//!    │  end (recording)       │   │ restart()                │ end
//!    │  -> resume ticket      │   v                          v
//!    └────────────────────────┘ RestartPending ──end──> start again / Idle
//! ```

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use super::engine::{RecognitionAlternative, RecognitionEngine, RecognitionErrorCode, RecognitionEvent};
use crate::config::CaptureConfig;
use crate::error::{Result, ScribeError};

/// State of the native recognition session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No native session is running.
    Idle,
    /// A native session is running.
    Listening,
    /// Stop was requested so that a new session starts right after end.
    RestartPending,
    /// Stop was requested by the user; end must not resume.
    ManuallyStopping,
}

/// What the user asked for, independent of native session churn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingIntent {
    Recording,
    Paused,
    Stopped,
}

/// Identifies one scheduled resume. Only the latest ticket is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeTicket(u64);

/// A resume the owner must perform by calling
/// [`CaptureController::resume_due`] after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledResume {
    pub delay: Duration,
    pub ticket: ResumeTicket,
}

/// Result of handling a native end (or a due resume).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOutcome {
    /// Nothing to do: no session was running or the ticket is stale.
    Ignored,
    /// The session ended for good.
    Stopped,
    /// A new native session was started immediately.
    Restarted,
    /// The session ended spontaneously; resume later.
    ResumeAfter(ScheduledResume),
    /// Starting a new session failed; the recording is over.
    GaveUp,
}

impl EndOutcome {
    pub fn scheduled(&self) -> Option<ScheduledResume> {
        match self {
            EndOutcome::ResumeAfter(resume) => Some(*resume),
            _ => None,
        }
    }
}

/// Notifications for the host. Sent on an unbounded channel so the state
/// machine never blocks on a slow consumer.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A new, de-duplicated final transcript fragment.
    FinalTranscript(String),
    /// The current interim text (empty when cleared).
    Interim(String),
    /// The logical listening flag changed.
    ListeningChanged(bool),
    /// The recording was terminated by an error.
    Error(ScribeError),
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureStatus {
    pub state: CaptureState,
    pub intent: RecordingIntent,
    pub is_listening: bool,
    pub is_supported: bool,
    pub interim_transcript: String,
    pub language: String,
}

pub struct CaptureController<E: RecognitionEngine> {
    engine: E,
    config: CaptureConfig,
    state: CaptureState,
    intent: RecordingIntent,
    interim_transcript: String,
    last_final: Option<String>,
    resume_generation: u64,
    pending_resume: Option<ResumeTicket>,
    events: UnboundedSender<CaptureEvent>,
}

impl<E: RecognitionEngine> CaptureController<E> {
    pub fn new(engine: E, config: CaptureConfig, events: UnboundedSender<CaptureEvent>) -> Self {
        Self {
            engine,
            config,
            state: CaptureState::Idle,
            intent: RecordingIntent::Stopped,
            interim_transcript: String::new(),
            last_final: None,
            resume_generation: 0,
            pending_resume: None,
            events,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn intent(&self) -> RecordingIntent {
        self.intent
    }

    /// True while a logical recording is active, across native restarts.
    pub fn is_listening(&self) -> bool {
        self.intent == RecordingIntent::Recording
    }

    pub fn interim_transcript(&self) -> &str {
        &self.interim_transcript
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    pub fn is_supported(&self) -> bool {
        self.engine.is_supported()
    }

    pub fn status(&self) -> CaptureStatus {
        CaptureStatus {
            state: self.state,
            intent: self.intent,
            is_listening: self.is_listening(),
            is_supported: self.engine.is_supported(),
            interim_transcript: self.interim_transcript.clone(),
            language: self.config.language.clone(),
        }
    }

    /// Starts a new logical recording.
    ///
    /// Duplicate suppression starts over. Calling this while already
    /// recording is a no-op.
    pub fn start_listening(&mut self) -> Result<()> {
        if !self.engine.is_supported() {
            return Err(ScribeError::Unsupported);
        }
        if self.is_listening() && self.state != CaptureState::Idle {
            return Ok(());
        }
        self.last_final = None;
        self.set_interim(String::new());
        self.activate()
    }

    /// Ends the logical recording. No resume will follow.
    pub fn stop_listening(&mut self) {
        self.pending_resume = None;
        self.set_interim(String::new());
        self.set_intent(RecordingIntent::Stopped);
        self.halt_native();
    }

    /// Suspends the recording so that it can be resumed later.
    pub fn pause_listening(&mut self) {
        if self.intent != RecordingIntent::Recording {
            return;
        }
        self.pending_resume = None;
        self.set_interim(String::new());
        self.set_intent(RecordingIntent::Paused);
        self.halt_native();
    }

    /// Continues a paused recording. Duplicate suppression is kept.
    pub fn resume_listening(&mut self) -> Result<()> {
        match self.intent {
            RecordingIntent::Recording => Ok(()),
            RecordingIntent::Stopped => Err(ScribeError::invalid_state(
                "cannot resume: recording is not paused",
            )),
            RecordingIntent::Paused => self.activate(),
        }
    }

    /// Restarts the native session, e.g. to apply a new language.
    ///
    /// Returns whether a restart was requested.
    pub fn restart_listening(&mut self) -> bool {
        if self.state != CaptureState::Listening {
            return false;
        }
        tracing::debug!("Restarting recognition session");
        self.state = CaptureState::RestartPending;
        self.engine.stop();
        true
    }

    /// Changes the recognition language, restarting a running session.
    pub fn set_language(&mut self, language: impl Into<String>) {
        let language = language.into();
        if language == self.config.language {
            return;
        }
        tracing::info!("Recognition language: {} -> {}", self.config.language, language);
        self.config.language = language;
        self.restart_listening();
    }

    /// Dispatches a native event. Returns a resume the owner has to schedule.
    pub fn handle_event(&mut self, event: RecognitionEvent) -> Option<ScheduledResume> {
        match event {
            RecognitionEvent::Result(alternatives) => {
                self.handle_result(&alternatives);
                None
            }
            RecognitionEvent::Error(code) => {
                self.handle_error(code);
                None
            }
            RecognitionEvent::End => self.handle_end().scheduled(),
        }
    }

    /// Processes a result event. Returns the emitted final text, if any.
    ///
    /// Finalized alternatives are concatenated and trimmed; an empty result or
    /// one identical to the previous final fragment is dropped. Results that
    /// trail a stop belong to no recording and are dropped as well.
    pub fn handle_result(&mut self, alternatives: &[RecognitionAlternative]) -> Option<String> {
        if self.intent == RecordingIntent::Stopped {
            tracing::debug!("Ignoring recognition result after the recording stopped");
            return None;
        }

        let mut interim = String::new();
        let mut finals = String::new();
        for alternative in alternatives {
            if alternative.is_final {
                finals.push_str(&alternative.transcript);
            } else {
                interim.push_str(&alternative.transcript);
            }
        }
        self.set_interim(interim);

        let text = finals.trim();
        if text.is_empty() {
            return None;
        }
        if self.last_final.as_deref() == Some(text) {
            tracing::debug!("Dropping duplicate final transcript");
            return None;
        }

        let text = text.to_string();
        self.last_final = Some(text.clone());
        self.emit(CaptureEvent::FinalTranscript(text.clone()));
        Some(text)
    }

    pub fn handle_error(&mut self, code: RecognitionErrorCode) {
        if code == RecognitionErrorCode::NoSpeech {
            tracing::debug!("No speech detected");
            return;
        }
        if !code.is_fatal() {
            tracing::warn!("Recognition error (continuing): {}", code);
            return;
        }

        tracing::error!("Recognition error, stopping: {}", code);
        self.state = CaptureState::Idle;
        self.pending_resume = None;
        self.set_interim(String::new());
        self.set_intent(RecordingIntent::Stopped);
        self.emit(CaptureEvent::Error(ScribeError::Recognition {
            code: code.to_string(),
        }));
    }

    /// Processes the end of a native session.
    pub fn handle_end(&mut self) -> EndOutcome {
        match self.state {
            CaptureState::Idle => EndOutcome::Ignored,
            CaptureState::ManuallyStopping => {
                self.state = CaptureState::Idle;
                tracing::debug!("Recognition session stopped");
                EndOutcome::Stopped
            }
            CaptureState::RestartPending => {
                self.state = CaptureState::Idle;
                match self.start_native() {
                    Ok(()) => EndOutcome::Restarted,
                    Err(_) => EndOutcome::GaveUp,
                }
            }
            CaptureState::Listening => {
                self.state = CaptureState::Idle;
                if !self.is_listening() {
                    return EndOutcome::Stopped;
                }
                self.resume_generation += 1;
                let ticket = ResumeTicket(self.resume_generation);
                self.pending_resume = Some(ticket);
                tracing::debug!(
                    "Recognition session ended on its own, resuming in {:?}",
                    self.config.restart_delay()
                );
                EndOutcome::ResumeAfter(ScheduledResume {
                    delay: self.config.restart_delay(),
                    ticket,
                })
            }
        }
    }

    /// Performs a scheduled resume, unless it has been superseded.
    pub fn resume_due(&mut self, ticket: ResumeTicket) -> EndOutcome {
        if self.pending_resume != Some(ticket) {
            return EndOutcome::Ignored;
        }
        self.pending_resume = None;
        if !self.is_listening() || self.state != CaptureState::Idle {
            return EndOutcome::Ignored;
        }
        match self.start_native() {
            Ok(()) => EndOutcome::Restarted,
            Err(_) => EndOutcome::GaveUp,
        }
    }

    /// Brings the native side in line with a `Recording` intent.
    fn activate(&mut self) -> Result<()> {
        match self.state {
            CaptureState::Listening | CaptureState::RestartPending => {
                self.set_intent(RecordingIntent::Recording);
                Ok(())
            }
            CaptureState::ManuallyStopping => {
                // The running session is still winding down; start again on its end.
                self.state = CaptureState::RestartPending;
                self.set_intent(RecordingIntent::Recording);
                Ok(())
            }
            CaptureState::Idle => {
                self.pending_resume = None;
                self.start_native()?;
                self.set_intent(RecordingIntent::Recording);
                Ok(())
            }
        }
    }

    fn start_native(&mut self) -> Result<()> {
        self.engine.set_continuous(true);
        self.engine.set_interim_results(self.config.interim_results);
        self.engine.set_language(&self.config.language);

        match self.engine.start() {
            Ok(()) => {
                self.state = CaptureState::Listening;
                tracing::debug!("Recognition session started ({})", self.config.language);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to start recognition session: {}", e);
                let error = ScribeError::Recognition {
                    code: e.to_string(),
                };
                self.state = CaptureState::Idle;
                self.pending_resume = None;
                self.set_interim(String::new());
                if self.intent == RecordingIntent::Recording {
                    self.set_intent(RecordingIntent::Stopped);
                    self.emit(CaptureEvent::Error(error.clone()));
                }
                Err(error)
            }
        }
    }

    fn halt_native(&mut self) {
        match self.state {
            CaptureState::Listening | CaptureState::RestartPending => {
                self.state = CaptureState::ManuallyStopping;
                self.engine.stop();
            }
            CaptureState::Idle | CaptureState::ManuallyStopping => {}
        }
    }

    fn set_intent(&mut self, intent: RecordingIntent) {
        let was_listening = self.is_listening();
        self.intent = intent;
        let listening = self.is_listening();
        if was_listening != listening {
            self.emit(CaptureEvent::ListeningChanged(listening));
        }
    }

    fn set_interim(&mut self, interim: String) {
        if interim != self.interim_transcript {
            self.interim_transcript = interim;
            self.emit(CaptureEvent::Interim(self.interim_transcript.clone()));
        }
    }

    fn emit(&self, event: CaptureEvent) {
        // A dropped receiver only means nobody is watching.
        let _ = self.events.send(event);
    }
}
