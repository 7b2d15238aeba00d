//! Directory-based SessionRepository implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use scribe_core::error::{Result, ScribeError};
use scribe_core::session::{Session, SessionRepository};

use crate::paths::ScribePaths;
use crate::storage::write_atomic;

/// Stores each session as a pretty-printed JSON document.
///
/// Directory structure:
/// ```text
/// base_dir/
/// ├── sessions/
/// │   ├── <session-id>.json
/// │   └── <session-id>.audio
/// └── active_session.txt
/// ```
pub struct DirSessionRepository {
    sessions_dir: PathBuf,
    active_file: PathBuf,
}

impl DirSessionRepository {
    /// Creates a repository at the default location.
    pub async fn default_location() -> Result<Self> {
        let paths = ScribePaths::resolve().map_err(|e| ScribeError::config(e.to_string()))?;
        Self::from_paths(&paths).await
    }

    pub async fn from_paths(paths: &ScribePaths) -> Result<Self> {
        Self::new(paths.base_dir()).await
    }

    /// Creates a repository rooted at `base_dir`, creating the directory
    /// structure if needed.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let paths = ScribePaths::with_base(base_dir.as_ref());
        let sessions_dir = paths.sessions_dir();
        fs::create_dir_all(&sessions_dir).await?;

        Ok(Self {
            sessions_dir,
            active_file: paths.active_session_file(),
        })
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    fn document_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_id(session_id)?;
        Ok(self.sessions_dir.join(format!("{}.json", session_id)))
    }

    fn audio_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_id(session_id)?;
        Ok(self.sessions_dir.join(format!("{}.audio", session_id)))
    }

    async fn read_document(path: &Path) -> Result<Session> {
        let content = fs::read_to_string(path).await?;
        let session: Session = serde_json::from_str(&content)?;
        Ok(session)
    }
}

/// Session ids become file names, so they must not escape the directory.
fn validate_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && !session_id.starts_with('.')
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ScribeError::invalid_state(format!(
            "invalid session id '{}'",
            session_id
        )))
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl SessionRepository for DirSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        let path = self.document_path(session_id)?;
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        Self::read_document(&path).await.map(Some)
    }

    async fn save(&self, session: &Session, audio: Option<&[u8]>) -> Result<()> {
        let path = self.document_path(&session.id)?;
        let json = serde_json::to_vec_pretty(session)?;
        write_atomic(&path, &json).await?;

        if let Some(audio) = audio {
            write_atomic(&self.audio_path(&session.id)?, audio).await?;
        }

        tracing::debug!("Saved session {} ({} messages)", session.id, session.messages.len());
        Ok(())
    }

    async fn load_audio(&self, session_id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.audio_path(session_id)?;
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        Ok(Some(fs::read(&path).await?))
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        remove_if_exists(&self.document_path(session_id)?).await?;
        remove_if_exists(&self.audio_path(session_id)?).await?;
        tracing::info!("Deleted session {}", session_id);
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Session>> {
        let mut sessions = Vec::new();
        let mut entries = fs::read_dir(&self.sessions_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_document(&path).await {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!("Skipping unreadable session file {:?}: {}", path, e);
                }
            }
        }

        // RFC 3339 timestamps from the same clock sort lexicographically
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn get_active_session_id(&self) -> Result<Option<String>> {
        if !fs::try_exists(&self.active_file).await? {
            return Ok(None);
        }

        let session_id = fs::read_to_string(&self.active_file).await?;
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Ok(None);
        }
        Ok(Some(session_id.to_string()))
    }

    async fn set_active_session_id(&self, session_id: Option<&str>) -> Result<()> {
        match session_id {
            Some(id) => {
                validate_id(id)?;
                write_atomic(&self.active_file, id.as_bytes()).await
            }
            None => remove_if_exists(&self.active_file).await,
        }
    }
}
