use anyhow::{Context, Result};
use colored::Colorize;

use crate::context::AppContext;

const MASK: &str = "********";

pub fn show(ctx: &AppContext) -> Result<()> {
    let mut config = ctx.config.clone();
    if config.gemini.has_api_key() {
        config.gemini.api_key = MASK.to_string();
    }
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}

pub fn path(ctx: &AppContext) {
    println!("{}", ctx.config_service.path().display());
}

pub fn set(ctx: &AppContext, key: &str, value: &str) -> Result<()> {
    ctx.config_service
        .update(|config| config.set_value(key, value))
        .with_context(|| format!("Failed to set {}", key))?;
    let shown = if key == "gemini.api_key" && !value.trim().is_empty() {
        MASK
    } else {
        value.trim()
    };
    println!("{} {} = {}", "Updated".green(), key, shown);
    Ok(())
}
