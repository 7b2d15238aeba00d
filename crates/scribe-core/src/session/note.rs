use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::request::RequestState;

/// A free-form note attached to a session (user-written or generated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestState>,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
            request: None,
        }
    }

    /// A note whose content is still being generated.
    pub fn pending(title: impl Into<String>) -> Self {
        Self {
            request: Some(RequestState::Pending),
            ..Self::new(title, "")
        }
    }
}
