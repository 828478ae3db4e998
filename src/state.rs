//! UI-agnostic session state types
//!
//! Everything here is plain data shared between the terminal UI and the
//! headless command. Only the [`GenerationController`](crate::controller::GenerationController)
//! mutates a [`ConversationState`].

use serde::{Deserialize, Serialize};

/// A chat message in the builder conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Per-session conversation and generation state.
///
/// Fields are read-only from outside the crate; the message log is
/// append-only.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) last_artifact: Option<String>,
    pub(crate) is_generating: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document, e.g. a file the user wants to edit.
    pub fn with_artifact(artifact: impl Into<String>) -> Self {
        Self {
            last_artifact: Some(artifact.into()),
            ..Self::default()
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_artifact(&self) -> Option<&str> {
        self.last_artifact.as_deref()
    }

    pub fn is_generating(&self) -> bool {
        self.is_generating
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            messages: self.messages.clone(),
            last_artifact: self.last_artifact.clone(),
            is_generating: self.is_generating,
        }
    }
}

/// Context sent to the model for one generation.
///
/// Built fresh from the session state each time and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prior_artifact: Option<String>,
    pub latest_user_message: String,
}

/// Result of one generation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success { artifact_text: String },
    Failure { error_message: String },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success { .. })
    }
}

/// Immutable copy of the session state handed to renderers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub messages: Vec<ChatMessage>,
    pub last_artifact: Option<String>,
    pub is_generating: bool,
}
