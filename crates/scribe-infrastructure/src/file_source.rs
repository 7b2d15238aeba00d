//! Turns files on disk into session sources.

use std::path::Path;
use tokio::fs;

use scribe_core::error::{Result, ScribeError};
use scribe_core::session::{Source, SourceKind};

/// Infers the MIME type from a filename extension using the `mime_guess` library.
pub fn infer_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

fn is_textual(mime_type: &str) -> bool {
    mime_type.starts_with("text/")
        || matches!(
            mime_type,
            "application/json"
                | "application/xml"
                | "application/toml"
                | "application/x-yaml"
                | "application/yaml"
                | "application/javascript"
        )
}

/// Reads `path` into a [`Source`].
///
/// Text files become `File` sources carrying their content. Audio files
/// become `Audio` sources with empty content (their text is produced by
/// transcription). Anything else is rejected.
pub async fn load_file_source(path: &Path) -> Result<Source> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| ScribeError::invalid_state(format!("not a file path: {:?}", path)))?;
    let mime_type = infer_mime_type(path);

    if mime_type.starts_with("audio/") {
        if !fs::try_exists(path).await? {
            return Err(ScribeError::not_found("File", path.display().to_string()));
        }
        return Ok(Source::new(name, SourceKind::Audio, ""));
    }

    if !is_textual(&mime_type) {
        return Err(ScribeError::invalid_state(format!(
            "unsupported source type '{}' for {}",
            mime_type, name
        )));
    }

    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScribeError::not_found("File", path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    let content = String::from_utf8_lossy(&bytes).to_string();

    tracing::debug!("Loaded {} ({}, {} bytes)", name, mime_type, bytes.len());
    Ok(Source::new(name, SourceKind::File { mime_type }, content))
}
