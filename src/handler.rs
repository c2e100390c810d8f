use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, View};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Global quit, works everywhere
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_clear_confirm {
        handle_confirm_dialog(app, key);
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,

        KeyCode::Enter => {
            if app.input.trim().is_empty() {
                // On the welcome card an empty input sends the highlighted
                // suggestion instead.
                if app.view == View::Welcome {
                    if let Some(suggestion) = app.selected_suggestion() {
                        app.submit(suggestion);
                    }
                }
            } else {
                let question = app.input.clone();
                app.submit(&question);
            }
        }

        KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.request_clear();
        }

        // Half-page transcript scroll
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::PageDown => app.scroll_half_page_down(),

        KeyCode::Up => {
            if app.view == View::Welcome && app.input.is_empty() {
                app.suggestion_up();
            } else {
                app.scroll_up();
            }
        }
        KeyCode::Down => {
            if app.view == View::Welcome && app.input.is_empty() {
                app.suggestion_down();
            } else {
                app.scroll_down();
            }
        }

        // Everything below edits the input, which is disabled while a
        // request is in flight.
        _ if app.processing => {}

        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let len = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(len);
        }
        KeyCode::Home => app.cursor = 0,
        KeyCode::End => app.cursor = app.input.chars().count(),

        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if app.cursor < app.input.chars().count() {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }

        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }

        _ => {}
    }
}

fn handle_confirm_dialog(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_clear(),
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => app.cancel_clear(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendClient;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> App {
        App::new(BackendClient::new("http://127.0.0.1:8000"))
    }

    #[test]
    fn test_typing_inserts_at_cursor() {
        let mut app = test_app();
        handle_key(&mut app, key(KeyCode::Char('a')));
        handle_key(&mut app, key(KeyCode::Char('c')));
        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, key(KeyCode::Char('b')));
        assert_eq!(app.input, "abc");
        assert_eq!(app.cursor, 2);
    }

    #[test]
    fn test_backspace_is_char_boundary_safe() {
        let mut app = test_app();
        handle_key(&mut app, key(KeyCode::Char('é')));
        handle_key(&mut app, key(KeyCode::Char('t')));
        handle_key(&mut app, key(KeyCode::Left));
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.input, "t");
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn test_editing_disabled_while_processing() {
        let mut app = test_app();
        app.processing = true;
        handle_key(&mut app, key(KeyCode::Char('x')));
        handle_key(&mut app, key(KeyCode::Backspace));
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_dialog_consumes_keys() {
        let mut app = test_app();
        app.show_clear_confirm = true;
        handle_key(&mut app, key(KeyCode::Char('x')));
        assert!(app.input.is_empty());
        assert!(app.show_clear_confirm);

        handle_key(&mut app, key(KeyCode::Char('n')));
        assert!(!app.show_clear_confirm);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = test_app();
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }
}
