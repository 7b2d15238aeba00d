use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;

use scribe_application::{AssistantService, SessionUseCase};
use scribe_interaction::GeminiAssistant;

use crate::context::AppContext;

/// Loads the session into a store and wires the assistant onto it.
async fn service(ctx: &AppContext, session_id: &str) -> Result<(AssistantService, SessionUseCase)> {
    let sessions = ctx.sessions().await?;
    sessions.load_session(session_id).await?;
    let agent = Arc::new(GeminiAssistant::new(ctx.gemini()?)?);
    Ok((AssistantService::new(sessions.store().clone(), agent), sessions))
}

pub async fn ask(ctx: &AppContext, session_id: &str, question: &str) -> Result<()> {
    let (assistant, sessions) = service(ctx, session_id).await?;

    let message_id = assistant.ask(question).await?;
    sessions.save_now().await?;

    let session = sessions.store().current();
    let Some(message) = session.find_message(&message_id) else {
        return Ok(());
    };
    println!("{}", message.answer.as_deref().unwrap_or(&message.text));
    if !message.citations.is_empty() {
        println!();
        for citation in &message.citations {
            println!(
                "{} {} {}",
                format!("[{}]", citation.index).yellow(),
                citation.source_name.bold(),
                format!("\"{}\"", citation.fragment).dimmed()
            );
        }
    }
    Ok(())
}

pub async fn summarize(ctx: &AppContext, session_id: &str) -> Result<()> {
    let (assistant, sessions) = service(ctx, session_id).await?;

    let result = assistant.summarize().await;
    // The note records the failure too, so save either way.
    sessions.save_now().await?;
    let note_id = result?;

    let session = sessions.store().current();
    if let Some(note) = session.notes.iter().find(|n| n.id == note_id) {
        println!("{}\n{}", note.title.underline(), note.content);
    }
    Ok(())
}
