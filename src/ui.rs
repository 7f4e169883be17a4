use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::App;
use crate::state::Role;
use crate::widget::ChatWidget;

/// Render `**bold**` runs in a reply. An unpaired `**` is kept literally.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    // An even number of parts means the last `**` never closed
    let unpaired = parts.len() % 2 == 0;

    let mut spans: Vec<Span<'static>> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let is_last = i == parts.len() - 1;
        if i % 2 == 1 && !(unpaired && is_last) {
            if !part.is_empty() {
                spans.push(Span::styled(
                    part.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            }
        } else if i % 2 == 1 {
            spans.push(Span::raw(format!("**{}", part)));
        } else if !part.is_empty() {
            spans.push(Span::raw(part.to_string()));
        }
    }

    Line::from(spans)
}

fn role_style(role: Role) -> Style {
    let color = match role {
        Role::User => Color::Cyan,
        Role::Bot => Color::Yellow,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Chefbot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("→ {}", app.endpoint.url()),
            Style::default().fg(Color::White),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner size minus borders, used by scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let chat = transcript_paragraph(&app.widget, app.animation_frame)
        .block(block)
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

/// The wrapped transcript, shared by rendering and scroll clamping so both
/// count rows the same way.
pub(crate) fn transcript_paragraph(widget: &ChatWidget, animation_frame: u8) -> Paragraph<'static> {
    let messages = widget.messages();
    let loading = widget.is_loading();

    let text = if messages.is_empty() && !loading {
        Text::from(Span::styled(
            "Ask Chefbot what to cook...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line<'static>> = Vec::new();

        for msg in messages {
            lines.push(Line::from(Span::styled(
                format!("{}:", msg.role().label()),
                role_style(msg.role()),
            )));
            match msg.role() {
                Role::User => {
                    for line in msg.text().lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                Role::Bot => {
                    for line in msg.text().lines() {
                        lines.push(parse_markdown_line(line));
                    }
                }
            }
            lines.push(Line::default());
        }

        if loading {
            lines.push(Line::from(Span::styled(
                format!("{}:", Role::Bot.label()),
                role_style(Role::Bot),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    Paragraph::new(text).wrap(Wrap { trim: true })
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.widget.is_loading();
    let border_color = if loading { Color::DarkGray } else { Color::Yellow };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    if loading {
        let waiting = Paragraph::new("Waiting for reply...")
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
            .block(block);
        frame.render_widget(waiting, area);
        return;
    }

    // Horizontal scrolling keeps the cursor inside the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;
    let scroll_offset = if inner_width == 0 || cursor_pos < inner_width {
        0
    } else {
        cursor_pos - inner_width + 1
    };

    let visible_text: String = app
        .widget
        .draft()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, mode_style) = if app.widget.is_loading() {
        (" SENDING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    if !app.widget.is_loading() {
        spans.extend(vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
        ]);
    }
    spans.extend(vec![
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Ctrl+L ", key_style),
        Span::styled(" clear ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, Terminal};
    use crate::endpoint::BackendEndpoint;
    use crate::error::ChatError;
    use crate::service::{ChatRequest, ChatService};

    struct UnusedService;

    #[async_trait]
    impl ChatService for UnusedService {
        async fn send(&self, _request: &ChatRequest) -> Result<String, ChatError> {
            Err(ChatError::Connectivity("not used in rendering tests".to_string()))
        }
    }

    fn test_app() -> App {
        App::new(Arc::new(UnusedService), BackendEndpoint::resolve(None, None).unwrap())
    }

    fn draw(app: &mut App) -> String {
        draw_sized(app, 60, 16)
    }

    fn draw_sized(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    fn span_texts(line: &Line) -> Vec<(String, bool)> {
        line.spans
            .iter()
            .map(|s| (s.content.to_string(), s.style.add_modifier.contains(Modifier::BOLD)))
            .collect()
    }

    #[test]
    fn test_bold_markdown() {
        let line = parse_markdown_line("Try **pasta** tonight");
        assert_eq!(
            span_texts(&line),
            vec![
                ("Try ".to_string(), false),
                ("pasta".to_string(), true),
                (" tonight".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_unclosed_bold_is_literal() {
        let line = parse_markdown_line("a **b");
        assert_eq!(
            span_texts(&line),
            vec![("a ".to_string(), false), ("**b".to_string(), false)]
        );
    }

    #[test]
    fn test_empty_state_shows_placeholder_and_endpoint() {
        let mut app = test_app();
        let screen = draw(&mut app);
        assert!(screen.contains("Ask Chefbot what to cook"));
        assert!(screen.contains("127.0.0.1:5000"));
        assert!(screen.contains("READY"));
    }

    #[test]
    fn test_loading_state_shows_thinking() {
        let mut app = test_app();
        app.widget.begin_submit("hi").unwrap();

        let screen = draw(&mut app);

        assert!(screen.contains("You:"));
        assert!(screen.contains("Thinking."));
        assert!(screen.contains("Waiting for reply"));
        assert!(screen.contains("SENDING"));
    }

    #[test]
    fn test_render_records_chat_area_size() {
        let mut app = test_app();
        draw(&mut app);
        // 16 rows - header - input(3) - footer = 11, minus borders
        assert_eq!(app.chat_height, 9);
        assert_eq!(app.chat_width, 58);
    }

    #[test]
    fn test_scroll_to_bottom_shows_end_of_long_reply() {
        let mut app = test_app();
        // 22x10 leaves a 20x3 transcript viewport. Each 11-char word takes a
        // row of its own, more rows than the character count suggests.
        draw_sized(&mut app, 22, 10);
        assert_eq!((app.chat_width, app.chat_height), (20, 3));

        app.widget.begin_submit("dinner?").unwrap();
        app.widget.finish_submit(Ok(
            "caramelized caramelized caramelized caramelized ENDMARKER".to_string(),
        ));
        app.scroll_to_bottom();

        let screen = draw_sized(&mut app, 22, 10);
        assert!(screen.contains("ENDMARKER"));
    }

    #[test]
    fn test_scroll_down_reaches_last_wrapped_row() {
        let mut app = test_app();
        draw_sized(&mut app, 22, 10);
        app.widget.begin_submit("dinner?").unwrap();
        app.widget.finish_submit(Ok(
            "caramelized caramelized caramelized caramelized ENDMARKER".to_string(),
        ));

        app.scroll_down(u16::MAX);

        let screen = draw_sized(&mut app, 22, 10);
        assert!(screen.contains("ENDMARKER"));
        assert!(!screen.contains("dinner?"));
    }
}
