use serde::{Deserialize, Serialize};

/// Body of a successful storage action.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StatusMessage {
    pub status: String,
}

impl StatusMessage {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

/// Body of a rejected request.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ErrorMessage {
    pub code: u16,
    pub error: String,
}
