use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};

use crate::endpoint::BackendEndpoint;
use crate::error::ChatError;
use crate::service::ChatService;
use crate::ui;
use crate::widget::ChatWidget;

type ReplyTask = JoinHandle<Result<String, ChatError>>;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub widget: ChatWidget,
    pub endpoint: BackendEndpoint,

    // Draft editing
    pub cursor: usize, // char index into the draft

    // Transcript viewport
    pub scroll: u16,
    pub chat_height: u16, // inner height of the transcript area, set during render
    pub chat_width: u16,  // inner width, for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    service: Arc<dyn ChatService>,
    pending: Option<ReplyTask>,
}

impl App {
    pub fn new(service: Arc<dyn ChatService>, endpoint: BackendEndpoint) -> Self {
        Self {
            should_quit: false,
            widget: ChatWidget::new(),
            endpoint,
            cursor: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            service,
            pending: None,
        }
    }

    /// Submit the draft and start the request on a background task.
    /// Returns false when the widget declined (blank draft or already sending).
    pub fn send_draft(&mut self) -> bool {
        let Some(request) = self.widget.submit_on_enter() else {
            return false;
        };
        self.cursor = 0;
        self.scroll_to_bottom();

        let service = Arc::clone(&self.service);
        self.pending = Some(tokio::spawn(async move { service.send(&request).await }));
        true
    }

    pub fn has_pending_reply(&self) -> bool {
        self.pending.is_some()
    }

    /// Hand a finished request to the widget. Does nothing while it is still running.
    pub async fn poll_reply(&mut self) {
        let finished = self.pending.as_ref().is_some_and(|task| task.is_finished());
        if finished {
            self.wait_for_reply().await;
        }
    }

    /// Block until the in-flight request resolves.
    pub async fn wait_for_reply(&mut self) {
        if let Some(task) = self.pending.take() {
            let joined = task.await;
            self.resolve(joined);
        }
    }

    fn resolve(&mut self, joined: Result<Result<String, ChatError>, JoinError>) {
        let outcome = joined.unwrap_or_else(|e| {
            tracing::error!(error = %e, "chat request task did not complete");
            Err(ChatError::Connectivity(format!("request task failed: {}", e)))
        });
        self.widget.finish_submit(outcome);
        self.scroll_to_bottom();
    }

    pub fn clear_chat(&mut self) {
        self.widget.clear();
        self.scroll = 0;
    }

    pub fn quit(&mut self) {
        if self.pending.is_some() {
            tracing::info!("quitting with a chat request still in flight");
        }
        self.should_quit = true;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.widget.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Draft editing. Every edit goes through the widget so it stays the
    // single owner of the draft text.

    pub fn insert_char(&mut self, c: char) {
        let mut draft = self.widget.draft().to_string();
        let byte_pos = char_to_byte_index(&draft, self.cursor);
        draft.insert(byte_pos, c);
        self.widget.update_draft(draft);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let mut draft = self.widget.draft().to_string();
        let byte_pos = char_to_byte_index(&draft, self.cursor);
        draft.remove(byte_pos);
        self.widget.update_draft(draft);
    }

    pub fn delete(&mut self) {
        let mut draft = self.widget.draft().to_string();
        if self.cursor < draft.chars().count() {
            let byte_pos = char_to_byte_index(&draft, self.cursor);
            draft.remove(byte_pos);
            self.widget.update_draft(draft);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.widget.draft().chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.widget.draft().chars().count();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.transcript_lines().saturating_sub(self.visible_height());
        self.scroll = self.scroll.saturating_add(lines).min(max);
    }

    /// Scroll so the newest message (or "Thinking...") is visible
    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.transcript_lines().saturating_sub(self.visible_height());
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    /// Rendered height of the transcript, using the same word wrap as `ui`.
    pub fn transcript_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };

        let total = ui::transcript_paragraph(&self.widget, self.animation_frame)
            .line_count(wrap_width);
        total.min(u16::MAX as usize) as u16
    }
}
