//! Gemini-backed assistant: grounded answers with citations, and summaries.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use scribe_core::assistant::{AgentAnswer, AssistantAgent, SourceContext};
use scribe_core::error::{Result, ScribeError};
use scribe_core::session::Citation;

use crate::gemini::{ResponseFormat, TextGenerator};
use crate::json::parse_reply;
use crate::prompts::PromptRenderer;

#[derive(Debug, Deserialize)]
struct AnswerReply {
    answer: String,
    #[serde(default)]
    citations: Vec<CitationReply>,
}

#[derive(Debug, Deserialize)]
struct CitationReply {
    index: u32,
    /// 1-based number of the quoted source in the prompt.
    source: usize,
    #[serde(default)]
    fragment: String,
}

pub struct GeminiAssistant {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptRenderer,
}

impl GeminiAssistant {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Result<Self> {
        Ok(Self {
            generator,
            prompts: PromptRenderer::new()?,
        })
    }
}

/// Resolves prompt-local source numbers to real sources. Citations pointing
/// at a source that was not in the prompt are dropped.
fn resolve_citations(citations: Vec<CitationReply>, sources: &[SourceContext]) -> Vec<Citation> {
    citations
        .into_iter()
        .filter_map(|citation| {
            let source = citation
                .source
                .checked_sub(1)
                .and_then(|i| sources.get(i));
            match source {
                Some(source) => Some(Citation {
                    index: citation.index,
                    source_id: source.id.clone(),
                    source_name: source.name.clone(),
                    fragment: citation.fragment,
                }),
                None => {
                    tracing::warn!("Dropping citation to unknown source #{}", citation.source);
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl AssistantAgent for GeminiAssistant {
    async fn answer(&self, question: &str, sources: &[SourceContext]) -> Result<AgentAnswer> {
        let prompt = self.prompts.answer(question, sources)?;
        let raw = self.generator.generate(&prompt, ResponseFormat::Json).await?;
        let reply: AnswerReply = parse_reply(&raw)?;

        Ok(AgentAnswer {
            answer: reply.answer.trim().to_string(),
            citations: resolve_citations(reply.citations, sources),
        })
    }

    async fn summarize(&self, sources: &[SourceContext]) -> Result<String> {
        if sources.iter().all(|s| s.content.trim().is_empty()) {
            return Err(ScribeError::invalid_state("nothing to summarize"));
        }
        let prompt = self.prompts.summary(sources)?;
        let summary = self.generator.generate(&prompt, ResponseFormat::Text).await?;
        Ok(summary.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedGenerator(String);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str, _format: ResponseFormat) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn sources() -> Vec<SourceContext> {
        vec![
            SourceContext {
                id: "src-transcript".to_string(),
                name: "Transcript".to_string(),
                content: "User: We ship on Friday".to_string(),
            },
            SourceContext {
                id: "src-agenda".to_string(),
                name: "agenda.txt".to_string(),
                content: "1. Release date".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_answer_resolves_citations() {
        let assistant = GeminiAssistant::new(Arc::new(CannedGenerator(
            r#"{"answer":" Friday [1] ","citations":[{"index":1,"source":1,"fragment":"We ship on Friday"},{"index":2,"source":9,"fragment":"?"}]}"#
                .to_string(),
        )))
        .unwrap();

        let answer = assistant.answer("When do we ship?", &sources()).await.unwrap();

        assert_eq!(answer.answer, "Friday [1]");
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].source_id, "src-transcript");
        assert_eq!(answer.citations[0].source_name, "Transcript");
        assert_eq!(answer.citations[0].fragment, "We ship on Friday");
    }

    #[tokio::test]
    async fn test_summarize_trims() {
        let assistant =
            GeminiAssistant::new(Arc::new(CannedGenerator("\n- Ship Friday\n".to_string()))).unwrap();
        assert_eq!(assistant.summarize(&sources()).await.unwrap(), "- Ship Friday");
    }

    #[tokio::test]
    async fn test_summarize_empty_sources_rejected() {
        let assistant = GeminiAssistant::new(Arc::new(CannedGenerator("x".to_string()))).unwrap();
        assert!(assistant.summarize(&[]).await.is_err());
    }
}
