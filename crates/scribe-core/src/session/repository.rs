//! Session repository trait.
//!
//! Defines the interface for session persistence operations.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for managing session persistence.
///
/// Sessions are stored as whole snapshots keyed by id, optionally with a
/// binary audio recording next to them. Writes are last-write-wins, so the
/// debounced autosave may drop or overlap calls safely.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Saves a session snapshot, and its audio when provided.
    ///
    /// Passing `None` for `audio` leaves any previously stored audio in place.
    async fn save(&self, session: &Session, audio: Option<&[u8]>) -> Result<()>;

    /// Loads the stored audio recording of a session, if any.
    async fn load_audio(&self, session_id: &str) -> Result<Option<Vec<u8>>>;

    /// Deletes a session and its audio (no error if it didn't exist).
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Lists the most recently updated sessions first, at most `limit`.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Session>>;

    /// Gets the ID of the currently active session.
    async fn get_active_session_id(&self) -> Result<Option<String>>;

    /// Sets (or clears, with `None`) the ID of the currently active session.
    async fn set_active_session_id(&self, session_id: Option<&str>) -> Result<()>;
}
