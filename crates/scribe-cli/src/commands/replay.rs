//! Replays a text transcript through the capture pipeline.
//!
//! Each non-empty line is delivered as one finalized recognition result, so
//! duplicate suppression, staging and diarization behave exactly as for a
//! live microphone.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use scribe_application::{Autosaver, RecordingService};
use scribe_core::capture::{
    EngineError, RecognitionAlternative, RecognitionEngine, RecognitionEvent,
};
use scribe_interaction::GeminiDiarizer;

use super::format;
use crate::context::AppContext;

/// Recognizer stand-in whose results come from the replayed file.
struct ReplayEngine;

impl RecognitionEngine for ReplayEngine {
    fn set_continuous(&mut self, _continuous: bool) {}
    fn set_interim_results(&mut self, _interim_results: bool) {}
    fn set_language(&mut self, language: &str) {
        tracing::debug!("Replay language: {}", language);
    }

    fn start(&mut self) -> std::result::Result<(), EngineError> {
        Ok(())
    }

    fn stop(&mut self) {}
}

fn fragments(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

pub async fn run(
    ctx: &AppContext,
    file: &Path,
    language: Option<&str>,
    title: Option<&str>,
) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let diarizer = Arc::new(GeminiDiarizer::new(ctx.gemini()?)?);

    let sessions = ctx.sessions().await?;
    let title = title
        .map(str::to_string)
        .or_else(|| file.file_stem().map(|s| s.to_string_lossy().into_owned()));
    let session = sessions.new_session(title.as_deref()).await?;
    let store = sessions.store().clone();

    let autosave = Autosaver::spawn(
        ctx.repository().await?,
        store.clone(),
        ctx.config.autosave.debounce(),
        CancellationToken::new(),
    );

    let recording = RecordingService::new(
        store.clone(),
        ReplayEngine,
        ctx.config.capture.clone(),
        diarizer,
    );
    recording.start(language)?;
    for fragment in fragments(&text) {
        recording.handle_recognition_event(RecognitionEvent::Result(vec![
            RecognitionAlternative::finalized(fragment),
        ]));
    }
    println!(
        "{} {} fragments, diarizing...",
        "Replayed".green(),
        recording.staged_count()
    );

    let stopped = recording.stop().await;
    autosave.shutdown().await;
    let added = stopped.context("Diarization failed")?;
    sessions.save_now().await?;

    for message in store.current().transcript_messages() {
        println!("{}", format::transcript_line(message));
    }
    println!(
        "\n{} {} messages to {} {}",
        "Added".green(),
        added,
        session.title.bold(),
        format!("({})", session.id).dimmed()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_skip_blank_lines() {
        let lines: Vec<_> = fragments("Hello\n\n  how are you  \n").collect();
        assert_eq!(lines, vec!["Hello", "how are you"]);
    }
}
