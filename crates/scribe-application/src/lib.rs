//! Application layer for Scribe.
//!
//! This crate wires the domain types of `scribe-core` into the workflows the
//! front ends drive: recording, asking the assistant, and managing sessions.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod assistant;
pub mod capture_driver;
pub mod recording;
pub mod session;
pub mod session_usecase;

#[cfg(test)]
mod test_support;

pub use assistant::AssistantService;
pub use capture_driver::CaptureDriver;
pub use recording::RecordingService;
pub use session::{AudioSnapshot, AutosaveHandle, Autosaver, SessionStore, SessionUpdater};
pub use session_usecase::SessionUseCase;

/// Locks a std mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
