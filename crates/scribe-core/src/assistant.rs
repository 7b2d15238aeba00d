//! Question answering and summarization over session sources.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::{Citation, Source};

/// The view of a source handed to the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceContext {
    pub id: String,
    pub name: String,
    pub content: String,
}

impl From<&Source> for SourceContext {
    fn from(source: &Source) -> Self {
        Self {
            id: source.id.clone(),
            name: source.name.clone(),
            content: source.content.clone(),
        }
    }
}

/// An answer with references back into the sources.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentAnswer {
    pub answer: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[async_trait]
pub trait AssistantAgent: Send + Sync {
    /// Answers `question` grounded in `sources`.
    async fn answer(&self, question: &str, sources: &[SourceContext]) -> Result<AgentAnswer>;

    /// Produces a summary note body for `sources`.
    async fn summarize(&self, sources: &[SourceContext]) -> Result<String>;
}
