//! In-memory collaborators shared by the unit tests of this crate.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, mpsc};

use scribe_core::assistant::{AgentAnswer, AssistantAgent, SourceContext};
use scribe_core::capture::{EngineError, RecognitionEngine};
use scribe_core::diarization::{Diarizer, SpeakerSegment};
use scribe_core::error::{Result, ScribeError};
use scribe_core::session::{Session, SessionRepository};

#[derive(Default)]
pub struct MemoryRepository {
    pub sessions: Mutex<HashMap<String, Session>>,
    pub audio: Mutex<HashMap<String, Vec<u8>>>,
    pub active: Mutex<Option<String>>,
    pub saves: AtomicUsize,
    pub fail_saves: AtomicBool,
}

impl MemoryRepository {
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self, id: &str) -> Option<Session> {
        self.sessions.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl SessionRepository for MemoryRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn save(&self, session: &Session, audio: Option<&[u8]>) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ScribeError::io("disk full"));
        }
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        if let Some(audio) = audio {
            self.audio
                .lock()
                .unwrap()
                .insert(session.id.clone(), audio.to_vec());
        }
        Ok(())
    }

    async fn load_audio(&self, session_id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.audio.lock().unwrap().get(session_id).cloned())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.lock().unwrap().remove(session_id);
        self.audio.lock().unwrap().remove(session_id);
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self.sessions.lock().unwrap().values().cloned().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn get_active_session_id(&self) -> Result<Option<String>> {
        Ok(self.active.lock().unwrap().clone())
    }

    async fn set_active_session_id(&self, session_id: Option<&str>) -> Result<()> {
        *self.active.lock().unwrap() = session_id.map(str::to_string);
        Ok(())
    }
}

/// Engine that records calls. Shares its log across clones.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
    pub fail_starts: Arc<AtomicBool>,
}

impl RecognitionEngine for RecordingEngine {
    fn set_continuous(&mut self, _continuous: bool) {}
    fn set_interim_results(&mut self, _interim_results: bool) {}
    fn set_language(&mut self, _language: &str) {}

    fn start(&mut self) -> std::result::Result<(), EngineError> {
        if self.fail_starts.load(Ordering::SeqCst) {
            return Err(EngineError::new("engine unavailable"));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Diarizer returning queued replies, then echoing the input as the user.
#[derive(Default)]
pub struct ScriptedDiarizer {
    pub replies: Mutex<Vec<Result<Vec<SpeakerSegment>>>>,
    pub inputs: Mutex<Vec<String>>,
}

impl ScriptedDiarizer {
    pub fn push(&self, reply: Result<Vec<SpeakerSegment>>) {
        self.replies.lock().unwrap().push(reply);
    }
}

#[async_trait]
impl Diarizer for ScriptedDiarizer {
    async fn diarize(&self, text: &str, _language: &str) -> Result<Vec<SpeakerSegment>> {
        self.inputs.lock().unwrap().push(text.to_string());
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(vec![SpeakerSegment::new(
                scribe_core::session::Sender::User,
                text,
            )]);
        }
        replies.remove(0)
    }
}

/// Agent whose replies are released by the test through a channel.
pub struct GatedAgent {
    pub called: Notify,
    pub seen_sources: Mutex<Vec<Vec<SourceContext>>>,
    answers: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<AgentAnswer>>>,
    summaries: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<String>>>,
}

pub struct AgentGate {
    pub answers: mpsc::UnboundedSender<Result<AgentAnswer>>,
    pub summaries: mpsc::UnboundedSender<Result<String>>,
}

impl GatedAgent {
    pub fn new() -> (Arc<Self>, AgentGate) {
        let (answer_tx, answer_rx) = mpsc::unbounded_channel();
        let (summary_tx, summary_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                called: Notify::new(),
                seen_sources: Mutex::new(Vec::new()),
                answers: tokio::sync::Mutex::new(answer_rx),
                summaries: tokio::sync::Mutex::new(summary_rx),
            }),
            AgentGate {
                answers: answer_tx,
                summaries: summary_tx,
            },
        )
    }
}

#[async_trait]
impl AssistantAgent for GatedAgent {
    async fn answer(&self, _question: &str, sources: &[SourceContext]) -> Result<AgentAnswer> {
        self.seen_sources.lock().unwrap().push(sources.to_vec());
        self.called.notify_one();
        self.answers
            .lock()
            .await
            .recv()
            .await
            .unwrap_or_else(|| Err(ScribeError::internal("gate closed")))
    }

    async fn summarize(&self, sources: &[SourceContext]) -> Result<String> {
        self.seen_sources.lock().unwrap().push(sources.to_vec());
        self.called.notify_one();
        self.summaries
            .lock()
            .await
            .recv()
            .await
            .unwrap_or_else(|| Err(ScribeError::internal("gate closed")))
    }
}
