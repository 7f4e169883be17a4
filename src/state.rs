//! UI-agnostic conversation state
//!
//! These types describe what the chat screen shows and carry no dependency on
//! the terminal front end. Only [`crate::widget::ChatWidget`] mutates them.

use serde::{Deserialize, Serialize};

/// Who authored a message in the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Bot => "Chefbot",
        }
    }
}

/// A single transcript entry. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Everything the chat screen renders.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub(crate) messages: Vec<Message>,
    pub(crate) draft_input: String,
    pub(crate) is_loading: bool,
}

impl ConversationState {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft_input(&self) -> &str {
        &self.draft_input
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }
}
