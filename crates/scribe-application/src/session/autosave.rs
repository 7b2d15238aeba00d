//! Debounced background persistence of the active session.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use scribe_core::session::{Session, SessionRepository};

use super::store::SessionStore;

/// Handle to a running autosave task.
pub struct AutosaveHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl AutosaveHandle {
    /// Flushes any pending change and waits for the task to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            tracing::warn!("Autosave task ended abnormally: {}", e);
        }
    }
}

pub struct Autosaver;

impl Autosaver {
    /// Watches `store` and writes the latest snapshot once it has been quiet
    /// for `debounce`.
    ///
    /// The task runs until `cancel` fires; a change that is still waiting
    /// for its quiet period is written before exiting.
    pub fn spawn(
        repository: Arc<dyn SessionRepository>,
        store: Arc<SessionStore>,
        debounce: Duration,
        cancel: CancellationToken,
    ) -> AutosaveHandle {
        let task = AutosaveTask {
            repository,
            saved_audio_revision: store.audio().revision,
            store,
            debounce,
        };
        let join = tokio::spawn(task.run(cancel.clone()));
        AutosaveHandle { cancel, join }
    }
}

struct AutosaveTask {
    repository: Arc<dyn SessionRepository>,
    store: Arc<SessionStore>,
    debounce: Duration,
    saved_audio_revision: u64,
}

impl AutosaveTask {
    async fn run(mut self, cancel: CancellationToken) {
        let mut changes = self.store.subscribe();

        let mut pending: Option<Arc<Session>> = None;
        let mut deadline = Instant::now();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let latest = Arc::clone(&changes.borrow_and_update());
                    if let Some(previous) = pending.as_ref().filter(|p| p.id != latest.id) {
                        // The store switched sessions; whoever switched it
                        // already persisted the old one.
                        tracing::debug!("[Autosave] Dropping pending save of {}", previous.id);
                    }
                    pending = Some(latest);
                    deadline = Instant::now() + self.debounce;
                }
                _ = sleep_until(deadline), if pending.is_some() => {
                    if let Some(session) = pending.take() {
                        self.flush(&session).await;
                    }
                }
            }
        }

        if changes.has_changed().unwrap_or(false) {
            pending = Some(Arc::clone(&changes.borrow_and_update()));
        }
        if let Some(session) = pending.take() {
            self.flush(&session).await;
        }
        tracing::debug!("[Autosave] Stopped");
    }

    async fn flush(&mut self, session: &Session) {
        let audio = self.store.audio();
        let audio_changed = audio.revision != self.saved_audio_revision;
        if session.is_pristine() && (!audio_changed || audio.data.is_none()) {
            tracing::debug!("[Autosave] Skipping pristine session {}", session.id);
            self.saved_audio_revision = audio.revision;
            return;
        }
        let bytes = if audio_changed { audio.data } else { None };

        match self
            .repository
            .save(session, bytes.as_deref().map(Vec::as_slice))
            .await
        {
            Ok(()) => {
                self.saved_audio_revision = audio.revision;
                tracing::debug!("[Autosave] Saved session {}", session.id);
            }
            Err(e) => tracing::warn!("[Autosave] Failed to save session {}: {}", session.id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryRepository;
    use std::sync::atomic::Ordering;

    const DEBOUNCE: Duration = Duration::from_millis(1500);

    fn setup() -> (Arc<MemoryRepository>, Arc<SessionStore>) {
        (
            Arc::new(MemoryRepository::default()),
            Arc::new(SessionStore::new(Session::new("Autosave"), 0)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_coalesced_into_one_write() {
        let (repository, store) = setup();
        let handle = Autosaver::spawn(
            repository.clone(),
            store.clone(),
            DEBOUNCE,
            CancellationToken::new(),
        );
        tokio::task::yield_now().await;

        for i in 0..5 {
            store.update(|s| s.title = format!("edit {i}"), false);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(repository.save_count(), 0);

        tokio::time::sleep(DEBOUNCE + Duration::from_millis(10)).await;

        assert_eq!(repository.save_count(), 1);
        let stored = repository.stored(&store.session_id()).unwrap();
        assert_eq!(stored.title, "edit 4");

        handle.shutdown().await;
        assert_eq!(repository.save_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_change_is_flushed_on_shutdown() {
        let (repository, store) = setup();
        let handle = Autosaver::spawn(
            repository.clone(),
            store.clone(),
            DEBOUNCE,
            CancellationToken::new(),
        );
        tokio::task::yield_now().await;

        store.update(|s| s.title = "unsaved".to_string(), false);
        tokio::task::yield_now().await;
        handle.shutdown().await;

        assert_eq!(repository.save_count(), 1);
        assert_eq!(
            repository.stored(&store.session_id()).unwrap().title,
            "unsaved"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_error_does_not_stop_task() {
        let (repository, store) = setup();
        repository.fail_saves.store(true, Ordering::SeqCst);
        let handle = Autosaver::spawn(
            repository.clone(),
            store.clone(),
            DEBOUNCE,
            CancellationToken::new(),
        );
        tokio::task::yield_now().await;

        store.update(|s| s.title = "first".to_string(), false);
        tokio::time::sleep(DEBOUNCE * 2).await;
        assert_eq!(repository.save_count(), 1);

        repository.fail_saves.store(false, Ordering::SeqCst);
        store.update(|s| s.title = "second".to_string(), false);
        tokio::time::sleep(DEBOUNCE * 2).await;

        assert_eq!(repository.save_count(), 2);
        assert_eq!(
            repository.stored(&store.session_id()).unwrap().title,
            "second"
        );
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pristine_session_is_not_written() {
        let (repository, store) = setup();
        let handle = Autosaver::spawn(
            repository.clone(),
            store.clone(),
            DEBOUNCE,
            CancellationToken::new(),
        );
        tokio::task::yield_now().await;

        store.reset(Session::new("Fresh"), None);
        tokio::time::sleep(DEBOUNCE * 2).await;
        handle.shutdown().await;

        assert_eq!(repository.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_audio_written_only_when_changed() {
        let (repository, store) = setup();
        let handle = Autosaver::spawn(
            repository.clone(),
            store.clone(),
            DEBOUNCE,
            CancellationToken::new(),
        );
        tokio::task::yield_now().await;

        store.set_audio(vec![1, 2, 3]);
        tokio::time::sleep(DEBOUNCE * 2).await;
        assert_eq!(
            repository.audio.lock().unwrap().get(&store.session_id()),
            Some(&vec![1, 2, 3])
        );

        repository.audio.lock().unwrap().clear();
        store.update(|s| s.title = "text only".to_string(), false);
        tokio::time::sleep(DEBOUNCE * 2).await;

        assert_eq!(repository.save_count(), 2);
        assert!(repository.audio.lock().unwrap().is_empty());
        handle.shutdown().await;
    }
}
