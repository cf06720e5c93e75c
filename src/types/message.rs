//! Messages for completion requests

use serde::{Deserialize, Serialize};

/// Role of a message participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One completion candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub content: String,
}

/// Response to a completion request. Only the first candidate is read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub candidates: Vec<Candidate>,
}

impl CompletionResponse {
    /// Build a single-candidate response.
    pub fn single(content: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: content.into(),
            }],
        }
    }
}
