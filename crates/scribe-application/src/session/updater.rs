//! Session updater helper for stored sessions.
//!
//! Sessions that are not loaded in the store are edited with a plain
//! "find → update → save" cycle against the repository.

use std::sync::Arc;

use scribe_core::error::{Result, ScribeError};
use scribe_core::session::{Session, SessionRepository};

/// Helper struct for updating stored sessions.
///
/// `SessionUpdater` encapsulates the common pattern of:
/// 1. Loading a session from storage
/// 2. Applying updates
/// 3. Updating the timestamp
/// 4. Saving back to storage
pub struct SessionUpdater {
    repository: Arc<dyn SessionRepository>,
}

impl SessionUpdater {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    /// Updates a stored session by applying `updater`, returning the saved
    /// session.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The session doesn't exist
    /// - The updater function returns an error
    /// - Saving to storage fails
    pub async fn update<F>(&self, session_id: &str, updater: F) -> Result<Session>
    where
        F: FnOnce(&mut Session) -> Result<()>,
    {
        let mut session = self
            .repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| ScribeError::not_found("Session", session_id))?;

        updater(&mut session)?;
        session.touch();

        self.repository.save(&session, None).await?;
        tracing::debug!("[SessionUpdater] Saved session {}", session.id);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryRepository;

    #[tokio::test]
    async fn test_update_saves_changes() {
        let repository = Arc::new(MemoryRepository::default());
        let session = Session::new("Before");
        repository.save(&session, None).await.unwrap();

        let updater = SessionUpdater::new(repository.clone());
        updater
            .update(&session.id, |s| {
                s.title = "After".to_string();
                Ok(())
            })
            .await
            .unwrap();

        let stored = repository.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "After");
    }

    #[tokio::test]
    async fn test_update_missing_session() {
        let updater = SessionUpdater::new(Arc::new(MemoryRepository::default()));
        let err = updater.update("nope", |_| Ok(())).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_updater_does_not_save() {
        let repository = Arc::new(MemoryRepository::default());
        let session = Session::new("Keep");
        repository.save(&session, None).await.unwrap();

        let updater = SessionUpdater::new(repository.clone());
        let result = updater
            .update(&session.id, |s| {
                s.title = "Lost".to_string();
                Err(ScribeError::invalid_state("nope"))
            })
            .await;

        assert!(result.is_err());
        let stored = repository.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Keep");
    }
}
