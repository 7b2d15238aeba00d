//! Session message types.
//!
//! A message either belongs to the linear transcript (real timestamp, seconds
//! from recording start) or to the free-form chat thread (sentinel timestamp).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::request::RequestState;

/// Timestamp marking a message as part of the chat thread rather than the transcript.
pub const CHAT_THREAD_TIMESTAMP: f64 = -1.0;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Sender {
    /// The person operating the recorder.
    User,
    /// The other party in the conversation.
    Interlocutor,
    /// The AI assistant.
    Assistant,
}

impl Sender {
    /// Label used when rendering transcripts for humans and prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Interlocutor => "Interlocutor",
            Sender::Assistant => "Assistant",
        }
    }
}

/// A reference from an assistant answer back into a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based marker used inside the answer text (`[1]`, `[2]`, ...)
    pub index: u32,
    pub source_id: String,
    pub source_name: String,
    /// The quoted fragment of the source
    pub fragment: String,
}

/// A single message in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    /// Seconds from recording start, or [`CHAT_THREAD_TIMESTAMP`].
    pub timestamp: f64,
    pub sender: Sender,
    /// Final rendered answer of an assistant chat message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    /// Progress of the remote call filling `answer`/`citations`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestState>,
}

impl Message {
    /// Creates a transcript message at `timestamp` seconds.
    pub fn transcript(sender: Sender, text: impl Into<String>, timestamp: f64) -> Self {
        Self {
            id: new_message_id(),
            text: text.into(),
            timestamp: timestamp.max(0.0),
            sender,
            answer: None,
            citations: Vec::new(),
            request: None,
        }
    }

    /// Creates a chat-thread message.
    pub fn chat(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            text: text.into(),
            timestamp: CHAT_THREAD_TIMESTAMP,
            sender,
            answer: None,
            citations: Vec::new(),
            request: None,
        }
    }

    /// Creates an assistant chat message whose answer is still being produced.
    pub fn assistant_placeholder() -> Self {
        Self {
            request: Some(RequestState::Pending),
            ..Self::chat(Sender::Assistant, "")
        }
    }

    /// Whether this message is part of the linear transcript.
    pub fn is_transcript(&self) -> bool {
        self.timestamp >= 0.0
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.request, Some(RequestState::Pending))
    }
}

/// Generates a message id. Ids are UUID v4 strings.
pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_serde_is_lowercase() {
        let json = serde_json::to_string(&Sender::Interlocutor).unwrap();
        assert_eq!(json, "\"interlocutor\"");
        let parsed: Sender = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(parsed, Sender::Assistant);
        assert_eq!("User".parse::<Sender>().unwrap(), Sender::User);
        assert_eq!(Sender::User.to_string(), "user");
    }

    #[test]
    fn test_transcript_vs_chat() {
        let transcript = Message::transcript(Sender::User, "hi", 3.5);
        assert!(transcript.is_transcript());

        let chat = Message::chat(Sender::User, "question");
        assert!(!chat.is_transcript());
        assert_eq!(chat.timestamp, CHAT_THREAD_TIMESTAMP);

        let placeholder = Message::assistant_placeholder();
        assert!(placeholder.is_pending());
        assert_eq!(placeholder.sender, Sender::Assistant);
        assert!(!placeholder.is_transcript());
    }

    #[test]
    fn test_negative_transcript_timestamp_is_clamped() {
        let message = Message::transcript(Sender::Interlocutor, "x", -4.0);
        assert_eq!(message.timestamp, 0.0);
        assert!(message.is_transcript());
    }

    #[test]
    fn test_optional_fields_omitted() {
        let message = Message::chat(Sender::User, "hello");
        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("answer").is_none());
        assert!(json.get("citations").is_none());
        assert!(json.get("request").is_none());
        assert_eq!(json["timestamp"], -1.0);
    }
}
