//! Conversation types shared by every provider.

use crate::traits::ContentConverter;
use serde::{Deserialize, Serialize};

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message
    System,
    /// User message
    User,
    /// Assistant message
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn of a conversation.
///
/// Serializes to `{"role": ..., "content": ...}`, the shape both the local
/// server and OpenAI-compatible endpoints accept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author
    pub role: MessageRole,
    /// Plain text content
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an explicit role
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a message from editor markup, converting it to raw note text first.
    pub fn from_markup(
        role: MessageRole,
        markup: &str,
        converter: &dyn ContentConverter,
    ) -> Self {
        Self::new(role, converter.to_storage(markup))
    }
}

/// Split off the first system message.
///
/// Returns the system text (if any) and the remaining user/assistant turns in
/// their original order. Later system messages are dropped, since providers
/// with a separate instruction parameter have no system turn role.
pub fn split_system_instruction(messages: &[ChatMessage]) -> (Option<&str>, Vec<&ChatMessage>) {
    let mut system = None;
    let mut turns = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            MessageRole::System => {
                if system.is_none() {
                    system = Some(message.content.as_str());
                }
            }
            MessageRole::User | MessageRole::Assistant => turns.push(message),
        }
    }

    (system, turns)
}
