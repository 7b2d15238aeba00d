//! Undo-aware in-memory store for the active session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use scribe_core::error::Result;
use scribe_core::history::History;
use scribe_core::session::Session;

/// Audio recording attached to the session, versioned so that the autosaver
/// only rewrites it when it changed.
#[derive(Debug, Clone, Default)]
pub struct AudioSnapshot {
    pub revision: u64,
    pub data: Option<Arc<Vec<u8>>>,
}

struct StoreInner {
    history: History<Session>,
    audio: AudioSnapshot,
}

/// Holds the active session's undo history and publishes every visible
/// change on a watch channel.
///
/// All mutations go through copy-on-write recipes on a draft. A recipe that
/// leaves the draft unchanged creates no history entry, does not bump
/// `updated_at`, and publishes nothing.
pub struct SessionStore {
    inner: Mutex<StoreInner>,
    changes: watch::Sender<Arc<Session>>,
}

impl SessionStore {
    pub fn new(session: Session, max_depth: usize) -> Self {
        let history = History::new(session).with_max_depth(max_depth);
        let (changes, _) = watch::channel(Arc::clone(history.current()));
        Self {
            inner: Mutex::new(StoreInner {
                history,
                audio: AudioSnapshot::default(),
            }),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receives the current snapshot after every visible change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Session>> {
        self.changes.subscribe()
    }

    pub fn current(&self) -> Arc<Session> {
        Arc::clone(self.lock().history.current())
    }

    pub fn session_id(&self) -> String {
        self.lock().history.current().id.clone()
    }

    /// Applies `recipe` to a draft of the current session.
    ///
    /// Returns whether the session changed.
    pub fn update<F>(&self, recipe: F, skip_history: bool) -> bool
    where
        F: FnOnce(&mut Session),
    {
        self.try_update(
            |draft| {
                recipe(draft);
                Ok(())
            },
            skip_history,
        )
        .map(|(changed, ())| changed)
        .unwrap_or(false)
    }

    /// Like [`update`](Self::update), but the recipe may fail, in which case
    /// the draft is discarded and the session is left untouched.
    pub fn try_update<F, R>(&self, recipe: F, skip_history: bool) -> Result<(bool, R)>
    where
        F: FnOnce(&mut Session) -> Result<R>,
    {
        let mut inner = self.lock();
        let current = Arc::clone(inner.history.current());

        let mut draft = Session::clone(&current);
        let output = recipe(&mut draft)?;
        if draft == *current {
            return Ok((false, output));
        }

        draft.touch();
        inner.history.replace(draft, skip_history);
        self.publish(&inner);
        Ok((true, output))
    }

    /// Applies `recipe` to every snapshot in the undo history, creating no
    /// history of its own. Snapshots the recipe leaves unchanged are kept
    /// as they are.
    ///
    /// Returns whether the current session changed.
    pub fn patch_everywhere<F>(&self, mut recipe: F) -> bool
    where
        F: FnMut(&mut Session),
    {
        let mut inner = self.lock();
        let before = Arc::clone(inner.history.current());

        let patched = inner.history.patch_all(|draft| {
            let original = draft.clone();
            recipe(draft);
            if *draft != original {
                draft.touch();
            }
        });
        if patched == 0 {
            return false;
        }

        let changed = !Arc::ptr_eq(&before, inner.history.current());
        if changed {
            self.publish(&inner);
        }
        changed
    }

    pub fn undo(&self) -> bool {
        let mut inner = self.lock();
        let moved = inner.history.undo();
        if moved {
            self.publish(&inner);
        }
        moved
    }

    pub fn redo(&self) -> bool {
        let mut inner = self.lock();
        let moved = inner.history.redo();
        if moved {
            self.publish(&inner);
        }
        moved
    }

    pub fn can_undo(&self) -> bool {
        self.lock().history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.lock().history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Replaces the session wholesale and drops all undo history.
    ///
    /// The audio revision is kept monotonic so a watcher never mistakes the
    /// new recording for one it already saved.
    pub fn reset(&self, session: Session, audio: Option<Vec<u8>>) {
        let mut inner = self.lock();
        inner.history.reset(session);
        inner.audio.revision += 1;
        inner.audio.data = audio.map(Arc::new);
        tracing::debug!("Session store reset to {}", inner.history.current().id);
        self.publish(&inner);
    }

    /// Attaches (or replaces) the session's audio recording.
    pub fn set_audio(&self, audio: Vec<u8>) {
        let mut inner = self.lock();
        inner.audio.revision += 1;
        inner.audio.data = Some(Arc::new(audio));
        self.publish(&inner);
    }

    pub fn audio(&self) -> AudioSnapshot {
        self.lock().audio.clone()
    }

    fn publish(&self, inner: &StoreInner) {
        self.changes.send_replace(Arc::clone(inner.history.current()));
    }
}
