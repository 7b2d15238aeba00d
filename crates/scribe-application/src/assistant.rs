//! Assistant workflow: questions and summaries over the session's sources.
//!
//! Both operations first record a pending entity in the session, then call
//! the agent and patch that entity by id in every snapshot of the undo
//! history that holds it. The patch never creates an undo step of its own.

use std::sync::Arc;

use scribe_core::assistant::{AssistantAgent, SourceContext};
use scribe_core::error::{Result, ScribeError};
use scribe_core::session::{Message, Note, RequestState, Sender, Session};

use crate::session::SessionStore;

pub const SUMMARY_NOTE_TITLE: &str = "Summary";

pub struct AssistantService {
    store: Arc<SessionStore>,
    agent: Arc<dyn AssistantAgent>,
}

fn context_of(session: &Session) -> Vec<SourceContext> {
    session
        .context_sources()
        .into_iter()
        .map(SourceContext::from)
        .collect()
}

impl AssistantService {
    pub fn new(store: Arc<SessionStore>, agent: Arc<dyn AssistantAgent>) -> Self {
        Self { store, agent }
    }

    /// Asks the agent a question grounded on the selected sources.
    ///
    /// Returns the id of the assistant message holding the answer. On
    /// failure the pending message is removed again and the error returned.
    pub async fn ask(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ScribeError::invalid_state("question is empty"));
        }

        let placeholder = Message::assistant_placeholder();
        let placeholder_id = placeholder.id.clone();
        let asked = question.to_string();
        self.store.update(
            move |session| {
                session.append_message(Message::chat(Sender::User, asked));
                session.append_message(placeholder);
            },
            false,
        );

        let sources = context_of(&self.store.current());
        tracing::debug!("Asking assistant with {} sources", sources.len());

        match self.agent.answer(question, &sources).await {
            Ok(answer) => {
                self.store.patch_everywhere(|session| {
                    if let Some(message) = session.find_message_mut(&placeholder_id) {
                        message.text = answer.answer.clone();
                        message.answer = Some(answer.answer.clone());
                        message.citations = answer.citations.clone();
                        message.request = Some(RequestState::Fulfilled);
                    }
                });
                if self.store.current().find_message(&placeholder_id).is_none() {
                    tracing::debug!("Answer for {} arrived after its message was removed", placeholder_id);
                }
                Ok(placeholder_id)
            }
            Err(e) => {
                tracing::warn!("Assistant request failed: {}", e);
                self.store
                    .patch_everywhere(|session| session.messages.retain(|m| m.id != placeholder_id));
                Err(e)
            }
        }
    }

    /// Generates a summary note from the selected sources.
    ///
    /// Returns the note id. A failed request leaves the note in place,
    /// marked as failed.
    pub async fn summarize(&self) -> Result<String> {
        let note = Note::pending(SUMMARY_NOTE_TITLE);
        let note_id = note.id.clone();
        self.store
            .update(move |session| session.notes.push(note), false);

        let sources = context_of(&self.store.current());
        let result = self.agent.summarize(&sources).await;

        let state = match &result {
            Ok(_) => RequestState::Fulfilled,
            Err(e) => {
                tracing::warn!("Summary request failed: {}", e);
                RequestState::failed(e.to_string())
            }
        };
        let content = result.as_ref().ok();
        self.store.patch_everywhere(|session| {
            if let Some(note) = session.find_note_mut(&note_id) {
                if let Some(content) = content {
                    note.content = content.clone();
                }
                note.request = Some(state.clone());
            }
        });

        result.map(|_| note_id)
    }
}
