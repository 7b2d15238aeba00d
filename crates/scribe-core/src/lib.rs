//! Domain layer for Scribe: the session document, its undo history, the
//! continuous speech capture state machine and the collaborator interfaces
//! implemented by the outer crates.

pub mod assistant;
pub mod capture;
pub mod config;
pub mod diarization;
pub mod error;
pub mod history;
pub mod session;

pub use error::{Result, ScribeError};
