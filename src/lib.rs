pub mod app;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod handler;
pub mod logging;
pub mod service;
pub mod state;
pub mod tui;
pub mod ui;
pub mod widget;

// Re-export main types for convenience
pub use endpoint::{BackendEndpoint, EndpointSource};
pub use error::ChatError;
pub use service::{ChatRequest, ChatService, HttpChatService};
pub use state::{ConversationState, Message, Role};
pub use widget::{ChatWidget, Phase};
