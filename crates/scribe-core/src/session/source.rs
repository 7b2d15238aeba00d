//! Sources: named units of context the assistant can draw from.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;

/// What kind of context a source holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    /// The live transcript of the session. At most one per session.
    Transcription,
    /// A recorded or uploaded audio clip.
    Audio,
    /// An uploaded file.
    File { mime_type: String },
    /// A captured web page.
    Url { url: String },
}

/// A named, typed unit of context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    pub kind: SourceKind,
    /// Text content handed to the assistant.
    #[serde(default)]
    pub content: String,
    /// Mirrored transcript messages (transcription sources only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    pub created_at: String,
}

impl Source {
    pub fn new(name: impl Into<String>, kind: SourceKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            content: content.into(),
            messages: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates an empty transcription source.
    pub fn transcription() -> Self {
        Self::new("Transcript", SourceKind::Transcription, "")
    }

    pub fn is_transcription(&self) -> bool {
        self.kind == SourceKind::Transcription
    }
}

/// Renders transcript messages as `Sender: text` lines.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.sender.label(), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}
