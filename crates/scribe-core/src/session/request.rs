use serde::{Deserialize, Serialize};

/// State of a remote call attached to the entity it will fill in.
///
/// Entities are inserted as `Pending` before the call starts and patched by
/// id when it settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestState {
    Pending,
    Fulfilled,
    Failed { error: String },
}

impl RequestState {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}
