//! Event Handling
//!
//! Keyboard handling for tplace. Handlers never block on the network: any
//! request they start is spawned and reported back as an `AppEvent`.

use crate::app::{App, Mode};
use crate::view_state::ViewAction;
use anyhow::Result;
use crossterm::event::{poll, read, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Handle terminal events, returns true if the app should quit
pub fn handle_events(app: &mut App) -> Result<bool> {
    if poll(Duration::from_millis(100))? {
        if let Event::Key(key) = read()? {
            if key.kind == KeyEventKind::Release {
                return Ok(false);
            }
            return handle_key_event(app, key.code, key.modifiers);
        }
    }
    Ok(false)
}

pub fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Global quit shortcut
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, code, modifiers),
        Mode::Command => handle_command_mode(app, code, modifiers),
        Mode::Help => handle_help_mode(app, code),
        Mode::Confirm => handle_confirm_mode(app, code),
        Mode::Warning => handle_warning_mode(app, code),
        Mode::Input => handle_input_mode(app, code, modifiers),
        Mode::Detail => handle_detail_mode(app, code),
        Mode::Notifications => handle_notifications_mode(app, code),
    }
}

fn handle_normal_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    if app.filter_active {
        match code {
            KeyCode::Esc => app.clear_filter(),
            KeyCode::Enter => app.filter_active = false,
            KeyCode::Backspace => app.dispatch(ViewAction::PopFilterChar),
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                app.dispatch(ViewAction::PushFilterChar(c));
            }
            _ => {}
        }
        return Ok(false);
    }

    match code {
        KeyCode::Char('q') => return Ok(true),

        // Rows
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Home | KeyCode::Char('g') => app.go_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.go_to_bottom(),

        // Pages
        KeyCode::Char(']') | KeyCode::PageDown | KeyCode::Right => {
            app.dispatch(ViewAction::NextPage)
        }
        KeyCode::Char('[') | KeyCode::PageUp | KeyCode::Left => app.dispatch(ViewAction::PrevPage),
        KeyCode::Char('{') => app.dispatch(ViewAction::FirstPage),
        KeyCode::Char('}') => app.dispatch(ViewAction::LastPage),
        KeyCode::Char('+') | KeyCode::Char('=') => app.step_page_size(true),
        KeyCode::Char('-') => app.step_page_size(false),

        // Sorting
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('S') => app.dispatch(ViewAction::ToggleSortDirection),

        // Views
        KeyCode::Char(c @ '1'..='9') => {
            let idx = (c as usize) - ('1' as usize);
            if let Some(view) = crate::resource::view_keys().get(idx).cloned() {
                if view != app.view_key {
                    app.navigate_to_view(&view)?;
                }
            }
        }
        KeyCode::Char('R') => app.refresh(),

        // Selection
        KeyCode::Char(' ') => app.toggle_selection(),
        KeyCode::Char('a') => app.toggle_select_all(),

        // Mutations
        KeyCode::Char('n') => app.begin_create(),
        KeyCode::Char('x') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('X') => app.request_bulk_delete(),
        KeyCode::Char('t') => app.toggle_completed(),
        KeyCode::Char('f') => app.toggle_favorite(),
        KeyCode::Char('e') => app.edit_selected(),

        // Overlays
        KeyCode::Enter => app.open_detail(),
        KeyCode::Char('/') => app.filter_active = true,
        KeyCode::Char(':') => app.enter_command_mode(),
        KeyCode::Char('?') => app.enter_help_mode(),
        KeyCode::Char('N') => app.enter_notifications_mode(),
        KeyCode::Esc => {
            if !app.view_state.filter_text.is_empty() {
                app.clear_filter();
            } else {
                app.error_message = None;
            }
        }

        // Sub-resource shortcut (c = comments, o = photos)
        KeyCode::Char(c) => {
            let is_shortcut = app
                .current_resource()
                .and_then(|r| r.sub_resource.as_ref())
                .is_some_and(|sub| sub.shortcut == c.to_string());
            if is_shortcut {
                app.open_detail();
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_command_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    match code {
        KeyCode::Esc => app.exit_mode(),
        KeyCode::Enter => return app.execute_command(),
        KeyCode::Backspace => {
            app.command_text.pop();
            app.update_command_suggestions();
        }
        KeyCode::Tab | KeyCode::Right => app.apply_suggestion(),
        KeyCode::Down => app.next_suggestion(),
        KeyCode::Up => app.prev_suggestion(),
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_text.push(c);
            app.update_command_suggestions();
        }
        _ => {}
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    if matches!(
        code,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter
    ) {
        app.exit_mode();
    }
    Ok(false)
}

fn handle_confirm_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => app.exit_mode(),
        KeyCode::Left | KeyCode::Char('h') => {
            if let Some(pending) = app.pending_action.as_mut() {
                pending.selected_yes = true;
            }
        }
        KeyCode::Right | KeyCode::Char('l') => {
            if let Some(pending) = app.pending_action.as_mut() {
                pending.selected_yes = false;
            }
        }
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(pending) = app.pending_action.as_mut() {
                pending.selected_yes = true;
            }
            app.confirm_pending_action();
        }
        KeyCode::Enter => app.confirm_pending_action(),
        _ => {}
    }
    Ok(false)
}

fn handle_warning_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
        app.exit_mode();
    }
    Ok(false)
}

fn handle_input_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    let Some(input) = app.input.as_mut() else {
        app.exit_mode();
        return Ok(false);
    };

    match code {
        KeyCode::Esc => app.cancel_input(),
        KeyCode::Enter => app.submit_input(),
        KeyCode::Backspace => {
            input.text.pop();
            input.error = None;
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            input.text.push(c);
            input.error = None;
        }
        _ => {}
    }
    Ok(false)
}

fn handle_detail_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => app.close_detail(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Char('g') | KeyCode::Home => app.detail.scroll = 0,
        KeyCode::Char('a') => app.begin_comment(),
        KeyCode::Char('N') => app.enter_notifications_mode(),
        _ => {}
    }
    Ok(false)
}

fn handle_notifications_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('N') => app.exit_mode(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.previous(),
        KeyCode::Char('C') => {
            app.notification_manager.clear();
            app.notifications_selected = 0;
        }
        _ => {}
    }
    Ok(false)
}
