use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use scribe_core::error::ScribeError;
use scribe_core::session::Session;

use super::format;
use crate::context::AppContext;

async fn find(ctx: &AppContext, session_id: &str) -> Result<Session> {
    let repository = ctx.repository().await?;
    repository
        .find_by_id(session_id)
        .await?
        .ok_or_else(|| ScribeError::not_found("Session", session_id).into())
}

pub async fn list(ctx: &AppContext, limit: usize) -> Result<()> {
    let sessions = ctx.sessions().await?.list_recent(limit).await?;
    if sessions.is_empty() {
        println!("{}", "No sessions yet.".dimmed());
        return Ok(());
    }

    for session in sessions {
        println!(
            "{}  {}  {}",
            session.id.yellow(),
            session.title.bold(),
            format!(
                "{} messages, {} sources, updated {}",
                session.messages.len(),
                session.sources.len(),
                session.updated_at
            )
            .dimmed()
        );
    }
    Ok(())
}

pub async fn show(ctx: &AppContext, session_id: &str) -> Result<()> {
    let session = find(ctx, session_id).await?;

    println!("{} {}", session.title.bold(), format!("({})", session.id).dimmed());
    println!(
        "{}",
        format!(
            "language {}, diarization {}",
            session.settings.language,
            if session.settings.diarization_enabled { "on" } else { "off" }
        )
        .dimmed()
    );

    println!("\n{}", "Transcript".underline());
    for message in session.transcript_messages() {
        println!("{}", format::transcript_line(message));
    }

    let chat: Vec<_> = session.chat_messages().collect();
    if !chat.is_empty() {
        println!("\n{}", "Chat".underline());
        for message in chat {
            let text = message.answer.as_deref().unwrap_or(&message.text);
            print!("{}: {}", format::sender(message.sender), text);
            if let Some(state) = format::request_state(message.request.as_ref()) {
                print!(" ({})", state);
            }
            println!();
        }
    }

    if !session.sources.is_empty() {
        println!("\n{}", "Sources".underline());
        for source in &session.sources {
            let selected = session.selected_source_ids.contains(&source.id);
            println!(
                "{} {} {}",
                if selected { "*" } else { " " },
                source.name,
                format!("({} chars)", source.content.chars().count()).dimmed()
            );
        }
    }

    for note in &session.notes {
        println!("\n{}", note.title.underline());
        if let Some(state) = format::request_state(note.request.as_ref()) {
            println!("({})", state);
        }
        println!("{}", note.content);
    }
    Ok(())
}

pub async fn rename(ctx: &AppContext, session_id: &str, title: &str) -> Result<()> {
    let session = ctx.sessions().await?.rename(session_id, title).await?;
    println!("{} {}", "Renamed to".green(), session.title.bold());
    Ok(())
}

pub async fn delete(ctx: &AppContext, session_id: &str) -> Result<()> {
    // Fail on unknown ids instead of silently succeeding.
    find(ctx, session_id).await?;
    ctx.sessions().await?.delete_session(session_id).await?;
    println!("{} {}", "Deleted".green(), session_id);
    Ok(())
}

pub async fn export(ctx: &AppContext, session_id: &str, out: Option<&Path>) -> Result<()> {
    let session = find(ctx, session_id).await?;
    let json = serde_json::to_string_pretty(&session)?;

    match out {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} {}", "Exported to".green(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
