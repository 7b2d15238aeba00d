//! Speaker segmentation of finalized transcript text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::Sender;

/// A contiguous piece of text attributed to one speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSegment {
    pub sender: Sender,
    pub text: String,
}

impl SpeakerSegment {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }
}

/// Splits raw transcript text into speaker-attributed segments.
///
/// Implementations return segments in spoken order. The concatenated
/// segment texts should reproduce the input up to whitespace.
#[async_trait]
pub trait Diarizer: Send + Sync {
    async fn diarize(&self, text: &str, language: &str) -> Result<Vec<SpeakerSegment>>;
}
