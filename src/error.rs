//! Failures of a single chat round trip.

use thiserror::Error;

/// Shown when the service flags an error without saying what went wrong.
pub const GENERIC_ERROR_TEXT: &str = "Sorry, something went wrong.";

/// Why a request to the chat service did not produce a reply.
///
/// None of these are fatal. The widget turns every variant into a bot
/// message via [`ChatError::display_text`] and goes back to idle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The request could not be sent or no response came back.
    #[error("could not reach chat service: {0}")]
    Connectivity(String),

    /// A response arrived with a status outside 2xx.
    #[error("chat service returned HTTP {status}")]
    Server { status: u16 },

    /// The body carried a truthy `error` field.
    #[error("chat service reported an error: {}", .0.as_deref().unwrap_or("no details"))]
    Application(Option<String>),

    /// The body was not JSON or had no string `response`.
    #[error("malformed chat service reply: {0}")]
    MalformedResponse(String),
}

impl ChatError {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Connectivity(_) => "connectivity",
            ChatError::Server { .. } => "server",
            ChatError::Application(_) => "application",
            ChatError::MalformedResponse(_) => "malformed",
        }
    }

    /// The text shown to the user in place of a reply.
    pub fn display_text(&self) -> String {
        match self {
            ChatError::Connectivity(detail) => {
                format!("Error: Could not connect to the server ({}).", detail)
            }
            ChatError::Server { status } => {
                format!("Error: The server responded with status {}.", status)
            }
            ChatError::Application(Some(message)) => message.clone(),
            ChatError::Application(None) => GENERIC_ERROR_TEXT.to_string(),
            ChatError::MalformedResponse(_) => {
                "Error: The server sent an unexpected response.".to_string()
            }
        }
    }
}
