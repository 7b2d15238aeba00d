//! Session use case implementation.
//!
//! `SessionUseCase` owns the lifecycle of the session loaded in the
//! [`SessionStore`]: creating, switching, restoring and deleting sessions,
//! and keeping the repository's active-session pointer in step with it.

use std::sync::Arc;

use scribe_core::error::{Result, ScribeError};
use scribe_core::session::{Session, SessionRepository};

use crate::session::{SessionStore, SessionUpdater};

pub const DEFAULT_SESSION_TITLE: &str = "Untitled session";

pub struct SessionUseCase {
    /// Repository for session data persistence
    repository: Arc<dyn SessionRepository>,
    /// In-memory store holding the active session
    store: Arc<SessionStore>,
    /// find → update → save helper for sessions that are not loaded
    updater: SessionUpdater,
}

impl SessionUseCase {
    pub fn new(repository: Arc<dyn SessionRepository>, store: Arc<SessionStore>) -> Self {
        Self {
            updater: SessionUpdater::new(repository.clone()),
            repository,
            store,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Creates, saves and activates a new empty session.
    pub async fn new_session(&self, title: Option<&str>) -> Result<Session> {
        self.persist_current().await?;

        let session = Session::new(title.unwrap_or(DEFAULT_SESSION_TITLE));
        self.repository.save(&session, None).await?;
        self.store.reset(session.clone(), None);
        self.repository
            .set_active_session_id(Some(&session.id))
            .await?;

        tracing::info!("Created session {} ({})", session.id, session.title);
        Ok(session)
    }

    /// Loads a stored session (and its audio) into the store and makes it
    /// the active one. Undo history starts over.
    pub async fn load_session(&self, session_id: &str) -> Result<Session> {
        let current = self.store.current();
        if current.id == session_id {
            return Ok(Session::clone(&current));
        }

        let session = self
            .repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| ScribeError::not_found("Session", session_id))?;
        let audio = self.repository.load_audio(session_id).await?;

        self.persist_current().await?;
        self.store.reset(session.clone(), audio);
        self.repository.set_active_session_id(Some(session_id)).await?;

        tracing::info!("Loaded session {}", session_id);
        Ok(session)
    }

    /// Loads the session that was active when the application last ran.
    ///
    /// A pointer to a session that no longer exists is cleared.
    pub async fn restore_last_session(&self) -> Result<Option<Session>> {
        let Some(session_id) = self.repository.get_active_session_id().await? else {
            return Ok(None);
        };

        match self.load_session(&session_id).await {
            Ok(session) => Ok(Some(session)),
            Err(e) if e.is_not_found() => {
                tracing::warn!("Last active session {} is gone, clearing pointer", session_id);
                self.repository.set_active_session_id(None).await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn list_recent(&self, limit: usize) -> Result<Vec<Session>> {
        self.repository.list_recent(limit).await
    }

    /// Deletes a stored session. Deleting the loaded session replaces it
    /// with a fresh, unsaved one.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.repository.delete(session_id).await?;

        let active = self.repository.get_active_session_id().await?;
        if active.as_deref() == Some(session_id) {
            self.repository.set_active_session_id(None).await?;
        }

        if self.store.session_id() == session_id {
            self.store.reset(Session::new(DEFAULT_SESSION_TITLE), None);
        }

        tracing::info!("Deleted session {}", session_id);
        Ok(())
    }

    /// Renames a session, loaded or not.
    pub async fn rename(&self, session_id: &str, title: &str) -> Result<Session> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ScribeError::invalid_state("session title cannot be empty"));
        }

        if self.store.session_id() == session_id {
            self.store.update(|s| s.title = title.to_string(), false);
            self.save_now().await?;
            return Ok(Session::clone(&self.store.current()));
        }

        self.updater
            .update(session_id, |s| {
                s.title = title.to_string();
                Ok(())
            })
            .await
    }

    /// Writes the loaded session and its audio immediately.
    pub async fn save_now(&self) -> Result<()> {
        let session = self.store.current();
        let audio = self.store.audio();
        self.repository
            .save(&session, audio.data.as_deref().map(Vec::as_slice))
            .await
    }

    /// Saves the loaded session before it is replaced, unless it is a
    /// pristine session that was never stored.
    async fn persist_current(&self) -> Result<()> {
        let current = self.store.current();
        let stored = self.repository.find_by_id(&current.id).await?.is_some();
        if stored || !current.is_pristine() {
            self.save_now().await?;
        }
        Ok(())
    }
}
