use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use scribe_application::SessionUpdater;
use scribe_infrastructure::load_file_source;

use crate::context::AppContext;

pub async fn add(ctx: &AppContext, session_id: &str, path: &Path) -> Result<()> {
    let source = load_file_source(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = source.name.clone();

    let updater = SessionUpdater::new(ctx.repository().await?);
    updater
        .update(session_id, move |session| session.add_source(source))
        .await?;

    println!("{} {} to {}", "Added".green(), name.bold(), session_id);
    Ok(())
}
