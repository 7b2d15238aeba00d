//! Session domain model.
//!
//! `Session` is the single aggregate holding everything the user sees for one
//! recording/chat session. It is stored in the undo history as an immutable
//! snapshot, so every method here is a plain synchronous mutation meant to be
//! run on a draft copy.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;
use super::note::Note;
use super::source::{Source, render_transcript};
use crate::config::DEFAULT_LANGUAGE;
use crate::error::{Result, ScribeError};

/// Per-session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Recognition and diarization language (BCP-47)
    pub language: String,
    /// Whether finalized transcripts are sent for speaker segmentation
    pub diarization_enabled: bool,
    /// Whether the video track is requested alongside audio
    pub video_enabled: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            diarization_enabled: true,
            video_enabled: false,
        }
    }
}

/// A recording/chat session document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format), never reassigned
    pub id: String,
    /// Human-readable session title
    pub title: String,
    /// Timestamp when the session was created (RFC 3339)
    pub created_at: String,
    /// Timestamp when the session was last updated (RFC 3339)
    pub updated_at: String,
    /// Transcript and chat messages in generation order
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Context sources, unique by id
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Sources included when querying the assistant
    #[serde(default)]
    pub selected_source_ids: Vec<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub settings: SessionSettings,
    /// Studio tools currently open in the host UI
    #[serde(default)]
    pub active_tools: Vec<String>,
    /// Assistant configuration, kept as an opaque tree
    #[serde(default)]
    pub agent_config: serde_json::Value,
}

impl Session {
    /// Creates an empty session with a fresh id.
    pub fn new(title: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            created_at: now.clone(),
            updated_at: now,
            messages: Vec::new(),
            sources: Vec::new(),
            selected_source_ids: Vec::new(),
            notes: Vec::new(),
            settings: SessionSettings::default(),
            active_tools: Vec::new(),
            agent_config: serde_json::Value::Null,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// True for a session that was never edited since it was created and
    /// holds no content. Such a session is not worth writing to disk.
    pub fn is_pristine(&self) -> bool {
        self.updated_at == self.created_at
            && self.messages.is_empty()
            && self.sources.is_empty()
            && self.notes.is_empty()
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    pub fn find_message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn find_message_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Appends a message and keeps the transcript source in sync.
    pub fn append_message(&mut self, message: Message) {
        let is_transcript = message.is_transcript();
        self.messages.push(message);
        if is_transcript {
            self.sync_transcript_source();
        }
    }

    /// Replaces the text of a message.
    pub fn edit_message(&mut self, id: &str, text: impl Into<String>) -> Result<()> {
        let message = self
            .find_message_mut(id)
            .ok_or_else(|| ScribeError::not_found("Message", id))?;
        message.text = text.into();
        let is_transcript = message.is_transcript();
        if is_transcript {
            self.sync_transcript_source();
        }
        Ok(())
    }

    /// Removes a message, returning it.
    pub fn delete_message(&mut self, id: &str) -> Result<Message> {
        let index = self
            .messages
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| ScribeError::not_found("Message", id))?;
        let removed = self.messages.remove(index);
        if removed.is_transcript() {
            self.sync_transcript_source();
        }
        Ok(removed)
    }

    /// Splits a message in two at character offset `at`.
    ///
    /// The first half keeps the original id; the second half gets a new id,
    /// the same sender and timestamp, and is inserted right after it. Both
    /// halves are trimmed. Returns the id of the new message.
    pub fn split_message(&mut self, id: &str, at: usize) -> Result<String> {
        let index = self
            .messages
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| ScribeError::not_found("Message", id))?;

        let original = &self.messages[index];
        let char_count = original.text.chars().count();
        if at == 0 || at >= char_count {
            return Err(ScribeError::invalid_state(format!(
                "split offset {} outside 1..{} for message '{}'",
                at, char_count, id
            )));
        }

        let byte_at = original
            .text
            .char_indices()
            .nth(at)
            .map(|(i, _)| i)
            .unwrap_or(original.text.len());
        let head = original.text[..byte_at].trim().to_string();
        let tail = original.text[byte_at..].trim().to_string();

        let mut second = original.clone();
        second.id = super::message::new_message_id();
        second.text = tail;
        let second_id = second.id.clone();
        let is_transcript = second.is_transcript();

        self.messages[index].text = head;
        self.messages.insert(index + 1, second);
        if is_transcript {
            self.sync_transcript_source();
        }
        Ok(second_id)
    }

    /// Messages that belong to the linear transcript.
    pub fn transcript_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.is_transcript())
    }

    /// Messages that belong to the chat thread.
    pub fn chat_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| !m.is_transcript())
    }

    // ------------------------------------------------------------------
    // Sources
    // ------------------------------------------------------------------

    pub fn find_source(&self, id: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn transcript_source(&self) -> Option<&Source> {
        self.sources.iter().find(|s| s.is_transcription())
    }

    /// Adds a source, replacing any existing source with the same id.
    ///
    /// A second transcription source is rejected.
    pub fn add_source(&mut self, source: Source) -> Result<()> {
        if source.is_transcription()
            && self
                .transcript_source()
                .is_some_and(|existing| existing.id != source.id)
        {
            return Err(ScribeError::invalid_state(
                "session already has a transcription source",
            ));
        }

        match self.sources.iter_mut().find(|s| s.id == source.id) {
            Some(existing) => *existing = source,
            None => self.sources.push(source),
        }
        Ok(())
    }

    /// Removes a source and drops it from the selection.
    pub fn remove_source(&mut self, id: &str) -> Result<Source> {
        let index = self
            .sources
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ScribeError::not_found("Source", id))?;
        self.selected_source_ids.retain(|selected| selected != id);
        Ok(self.sources.remove(index))
    }

    /// Adds a source to the selection. Unknown ids are rejected.
    pub fn select_source(&mut self, id: &str) -> Result<()> {
        if self.find_source(id).is_none() {
            return Err(ScribeError::not_found("Source", id));
        }
        if !self.selected_source_ids.iter().any(|s| s == id) {
            self.selected_source_ids.push(id.to_string());
        }
        Ok(())
    }

    pub fn deselect_source(&mut self, id: &str) {
        self.selected_source_ids.retain(|selected| selected != id);
    }

    /// Sources the assistant should see: the selection, or every source
    /// when nothing is selected.
    pub fn context_sources(&self) -> Vec<&Source> {
        if self.selected_source_ids.is_empty() {
            return self.sources.iter().collect();
        }
        self.sources
            .iter()
            .filter(|s| self.selected_source_ids.contains(&s.id))
            .collect()
    }

    /// Creates the transcription source if missing and returns its id.
    pub fn ensure_transcript_source(&mut self) -> String {
        if let Some(existing) = self.transcript_source() {
            return existing.id.clone();
        }
        let source = Source::transcription();
        let id = source.id.clone();
        self.sources.push(source);
        self.sync_transcript_source();
        id
    }

    /// Mirrors the transcript messages into the transcription source.
    ///
    /// No-op when the session has no transcription source yet.
    pub fn sync_transcript_source(&mut self) {
        let mirrored: Vec<Message> = self.transcript_messages().cloned().collect();
        if let Some(source) = self.sources.iter_mut().find(|s| s.is_transcription()) {
            source.content = render_transcript(&mirrored);
            source.messages = mirrored;
        }
    }

    // ------------------------------------------------------------------
    // Notes
    // ------------------------------------------------------------------

    pub fn find_note_mut(&mut self, id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    /// Verifies the document invariants.
    pub fn check_invariants(&self) -> Result<()> {
        let transcription_sources = self.sources.iter().filter(|s| s.is_transcription()).count();
        if transcription_sources > 1 {
            return Err(ScribeError::invalid_state(format!(
                "{} transcription sources in session '{}'",
                transcription_sources, self.id
            )));
        }

        for (i, source) in self.sources.iter().enumerate() {
            if self.sources[..i].iter().any(|s| s.id == source.id) {
                return Err(ScribeError::invalid_state(format!(
                    "duplicate source id '{}'",
                    source.id
                )));
            }
        }

        if let Some(unknown) = self
            .selected_source_ids
            .iter()
            .find(|id| self.find_source(id).is_none())
        {
            return Err(ScribeError::invalid_state(format!(
                "selected source '{}' does not exist",
                unknown
            )));
        }

        if let Some(source) = self.transcript_source() {
            let mirrored: Vec<&Message> = self.transcript_messages().collect();
            let in_sync = source.messages.len() == mirrored.len()
                && source.messages.iter().zip(mirrored).all(|(a, b)| a == b);
            if !in_sync {
                return Err(ScribeError::invalid_state(
                    "transcription source is out of sync with messages",
                ));
            }
        }

        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new("Untitled session")
    }
}
