//! Gemini-backed speaker diarization.

use async_trait::async_trait;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

use scribe_core::diarization::{Diarizer, SpeakerSegment};
use scribe_core::error::Result;
use scribe_core::session::Sender;

use crate::gemini::{ResponseFormat, TextGenerator};
use crate::json::parse_reply;
use crate::prompts::PromptRenderer;

#[derive(Debug, Deserialize)]
struct DiarizationReply {
    #[serde(default)]
    segments: Vec<SegmentReply>,
}

#[derive(Debug, Deserialize)]
struct SegmentReply {
    speaker: String,
    text: String,
}

pub struct GeminiDiarizer {
    generator: Arc<dyn TextGenerator>,
    prompts: PromptRenderer,
}

impl GeminiDiarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Result<Self> {
        Ok(Self {
            generator,
            prompts: PromptRenderer::new()?,
        })
    }
}

/// Maps a model speaker label to a transcript sender.
///
/// Only the two conversation parties are valid; anything else is attributed
/// to the interlocutor.
fn speaker_to_sender(label: &str) -> Sender {
    match Sender::from_str(label.trim()) {
        Ok(Sender::User) => Sender::User,
        Ok(Sender::Interlocutor) => Sender::Interlocutor,
        _ => {
            tracing::warn!("Unknown speaker label '{}', using interlocutor", label);
            Sender::Interlocutor
        }
    }
}

fn into_segments(reply: DiarizationReply) -> Vec<SpeakerSegment> {
    reply
        .segments
        .into_iter()
        .filter_map(|segment| {
            let text = segment.text.trim();
            (!text.is_empty()).then(|| SpeakerSegment::new(speaker_to_sender(&segment.speaker), text))
        })
        .collect()
}

#[async_trait]
impl Diarizer for GeminiDiarizer {
    async fn diarize(&self, text: &str, language: &str) -> Result<Vec<SpeakerSegment>> {
        let prompt = self.prompts.diarization(text, language)?;
        let raw = self.generator.generate(&prompt, ResponseFormat::Json).await?;
        let segments = into_segments(parse_reply(&raw)?);
        tracing::debug!("Diarization produced {} segments", segments.len());
        Ok(segments)
    }
}
