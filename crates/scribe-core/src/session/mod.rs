//! Session domain module.
//!
//! This module contains the session document and everything nested in it,
//! plus the repository interface used to persist it.
//!
//! # Module Structure
//!
//! - `model`: The session aggregate (`Session`, `SessionSettings`)
//! - `message`: Transcript/chat messages (`Message`, `Sender`, `Citation`)
//! - `source`: Context sources (`Source`, `SourceKind`)
//! - `note`: Notes (`Note`)
//! - `request`: Remote call progress attached to entities (`RequestState`)
//! - `repository`: Repository trait for session persistence

mod message;
mod model;
mod note;
mod repository;
mod request;
mod source;

// Re-export public API
pub use message::{CHAT_THREAD_TIMESTAMP, Citation, Message, Sender, new_message_id};
pub use model::{Session, SessionSettings};
pub use note::Note;
pub use repository::SessionRepository;
pub use request::RequestState;
pub use source::{Source, SourceKind, render_transcript};
