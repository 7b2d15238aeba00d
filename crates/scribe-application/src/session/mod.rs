//! Active-session state management.
//!
//! - `store`: Undo-aware in-memory store publishing every change
//! - `autosave`: Debounced background persistence of the store
//! - `updater`: find → update → save helper for sessions that are not loaded

mod autosave;
mod store;
mod updater;

pub use autosave::{AutosaveHandle, Autosaver};
pub use store::{AudioSnapshot, SessionStore};
pub use updater::SessionUpdater;
