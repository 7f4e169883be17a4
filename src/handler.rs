use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::App;
use crate::tui::AppEvent;

const MOUSE_SCROLL_LINES: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Keys that work whether or not a reply is pending. AltGr arrives as
    // Ctrl+Alt on some platforms and stays plain text input.
    let altgr = key.modifiers.contains(KeyModifiers::CONTROL | KeyModifiers::ALT);
    if key.modifiers.contains(KeyModifiers::CONTROL) && !altgr {
        match key.code {
            KeyCode::Char('c') => app.quit(),
            KeyCode::Char('l') => app.clear_chat(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.quit();
            return;
        }
        KeyCode::PageUp => {
            app.scroll_up(app.chat_height.max(1));
            return;
        }
        KeyCode::PageDown => {
            app.scroll_down(app.chat_height.max(1));
            return;
        }
        KeyCode::Up => {
            app.scroll_up(1);
            return;
        }
        KeyCode::Down => {
            app.scroll_down(1);
            return;
        }
        _ => {}
    }

    // The input box is disabled while waiting; nothing is queued
    if app.widget.is_loading() {
        return;
    }

    match key.code {
        KeyCode::Enter => {
            app.send_draft();
        }
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollUp => app.scroll_up(MOUSE_SCROLL_LINES),
        _ => {}
    }
}
