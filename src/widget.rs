//! The chat view-model.
//!
//! `ChatWidget` owns the [`ConversationState`] and is the only thing allowed
//! to change it. A submission cycle is split into [`ChatWidget::begin_submit`]
//! and [`ChatWidget::finish_submit`] so the terminal event loop can run the
//! request on a background task in between; [`ChatWidget::submit`] does the
//! whole cycle inline.

use crate::error::ChatError;
use crate::service::{ChatRequest, ChatService};
use crate::state::{ConversationState, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
}

#[derive(Debug, Default)]
pub struct ChatWidget {
    state: ConversationState,
}

impl ChatWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        self.state.messages()
    }

    pub fn draft(&self) -> &str {
        self.state.draft_input()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn phase(&self) -> Phase {
        if self.state.is_loading {
            Phase::Sending
        } else {
            Phase::Idle
        }
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.state.draft_input = text.into();
    }

    /// Drop the transcript. Loading flag and draft stay as they are.
    pub fn clear(&mut self) {
        self.state.messages.clear();
    }

    /// Start a submission cycle.
    ///
    /// Returns `None` without touching state when `text` is blank or a
    /// request is already in flight. Otherwise the user message is appended,
    /// the draft cleared and the widget enters [`Phase::Sending`]; the caller
    /// must send the returned request exactly once and hand the outcome to
    /// [`ChatWidget::finish_submit`].
    pub fn begin_submit(&mut self, text: &str) -> Option<ChatRequest> {
        if self.state.is_loading || text.trim().is_empty() {
            return None;
        }

        self.state.messages.push(Message::user(text));
        self.state.draft_input.clear();
        self.state.is_loading = true;

        Some(ChatRequest {
            message: text.to_string(),
        })
    }

    /// Resolve the in-flight request with exactly one bot message.
    pub fn finish_submit(&mut self, outcome: Result<String, ChatError>) {
        if !self.state.is_loading {
            tracing::warn!("reply arrived with no request in flight, dropping it");
            return;
        }

        let text = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                tracing::info!(kind = e.kind(), error = %e, "showing chat error to user");
                e.display_text()
            }
        };
        self.state.messages.push(Message::bot(text));
        self.state.is_loading = false;
    }

    /// Enter key: submit whatever is in the draft.
    pub fn submit_on_enter(&mut self) -> Option<ChatRequest> {
        let draft = self.state.draft_input.clone();
        self.begin_submit(&draft)
    }

    /// Run a full cycle against `service`. Returns whether a request was sent.
    pub async fn submit<S>(&mut self, service: &S, text: &str) -> bool
    where
        S: ChatService + ?Sized,
    {
        let Some(request) = self.begin_submit(text) else {
            return false;
        };
        let outcome = service.send(&request).await;
        self.finish_submit(outcome);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Role;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned outcomes and records what it was asked.
    struct ScriptedService {
        outcomes: Mutex<VecDeque<Result<String, ChatError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedService {
        fn new(outcomes: Vec<Result<String, ChatError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatService for ScriptedService {
        async fn send(&self, request: &ChatRequest) -> Result<String, ChatError> {
            self.requests.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ChatError::Connectivity("script exhausted".to_string())))
        }
    }

    #[test]
    fn test_begin_submit_appends_user_message_before_any_request() {
        let mut widget = ChatWidget::new();
        widget.update_draft("hi");

        let request = widget.begin_submit("hi").unwrap();

        assert_eq!(request.message, "hi");
        assert_eq!(widget.messages(), &[Message::user("hi")]);
        assert_eq!(widget.draft(), "");
        assert!(widget.is_loading());
        assert_eq!(widget.phase(), Phase::Sending);
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut widget = ChatWidget::new();
        widget.update_draft("   ");

        assert!(widget.begin_submit("").is_none());
        assert!(widget.begin_submit(" \t\n").is_none());
        assert!(widget.submit_on_enter().is_none());

        assert!(widget.messages().is_empty());
        assert!(!widget.is_loading());
        assert_eq!(widget.draft(), "   ");
    }

    #[test]
    fn test_submit_while_loading_is_noop() {
        let mut widget = ChatWidget::new();
        widget.begin_submit("first").unwrap();
        widget.update_draft("second");

        assert!(widget.begin_submit("second").is_none());
        assert!(widget.submit_on_enter().is_none());

        assert_eq!(widget.messages().len(), 1);
        assert_eq!(widget.draft(), "second");
    }

    #[test]
    fn test_finish_submit_returns_to_idle() {
        let mut widget = ChatWidget::new();
        widget.begin_submit("hi").unwrap();
        widget.finish_submit(Ok("Hello".to_string()));

        assert_eq!(widget.phase(), Phase::Idle);
        assert_eq!(widget.messages().last(), Some(&Message::bot("Hello")));

        // A stray second resolution must not add anything.
        widget.finish_submit(Ok("again".to_string()));
        assert_eq!(widget.messages().len(), 2);
    }

    #[test]
    fn test_clear_keeps_loading_and_draft() {
        let mut widget = ChatWidget::new();
        widget.begin_submit("hi").unwrap();
        widget.update_draft("typing");

        widget.clear();

        assert!(widget.messages().is_empty());
        assert!(widget.is_loading());
        assert_eq!(widget.draft(), "typing");

        // The pending reply still lands after a clear.
        widget.finish_submit(Ok("late".to_string()));
        assert_eq!(widget.messages(), &[Message::bot("late")]);
    }

    #[test]
    fn test_clear_on_empty_widget() {
        let mut widget = ChatWidget::new();
        widget.clear();
        assert!(widget.messages().is_empty());
    }

    #[tokio::test]
    async fn test_submit_success() {
        let service = ScriptedService::new(vec![Ok("Hello".to_string())]);
        let mut widget = ChatWidget::new();

        assert!(widget.submit(&service, "hi").await);

        assert_eq!(widget.messages(), &[Message::user("hi"), Message::bot("Hello")]);
        assert!(!widget.is_loading());
        assert_eq!(
            service.requests(),
            vec![ChatRequest {
                message: "hi".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_submit_network_failure_becomes_bot_message() {
        let service = ScriptedService::new(vec![Err(ChatError::Connectivity(
            "connection refused".to_string(),
        ))]);
        let mut widget = ChatWidget::new();

        assert!(widget.submit(&service, "hi").await);

        let last = widget.messages().last().unwrap();
        assert_eq!(last.role(), Role::Bot);
        assert!(last.text().contains("Could not connect"));
        assert!(!widget.is_loading());
    }

    #[tokio::test]
    async fn test_submit_application_error_shows_server_text() {
        let service = ScriptedService::new(vec![Err(ChatError::Application(Some(
            "bad input".to_string(),
        )))]);
        let mut widget = ChatWidget::new();

        widget.submit(&service, "hi").await;

        assert_eq!(widget.messages().last().unwrap().text(), "bad input");
    }

    #[tokio::test]
    async fn test_blank_submit_sends_nothing() {
        let service = ScriptedService::new(vec![]);
        let mut widget = ChatWidget::new();

        assert!(!widget.submit(&service, "   ").await);

        assert!(widget.messages().is_empty());
        assert!(service.requests().is_empty());
    }

    #[tokio::test]
    async fn test_widget_usable_after_error() {
        let service = ScriptedService::new(vec![
            Err(ChatError::Server { status: 503 }),
            Ok("back online".to_string()),
        ]);
        let mut widget = ChatWidget::new();

        widget.submit(&service, "one").await;
        widget.submit(&service, "two").await;

        let texts: Vec<&str> = widget.messages().iter().map(Message::text).collect();
        assert_eq!(
            texts,
            vec![
                "one",
                "Error: The server responded with status 503.",
                "two",
                "back online"
            ]
        );
        assert_eq!(service.requests().len(), 2);
    }
}
