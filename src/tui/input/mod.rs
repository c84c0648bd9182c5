mod common;
mod edit;
mod form;
mod mouse;
mod navigate;

use crossterm::event::{KeyCode, KeyEvent, MouseEvent};

use super::app::{App, Mode};

// Submodules reach each other's handlers through `use super::*;`
#[allow(unused_imports)]
use common::*;
#[allow(unused_imports)]
use edit::*;
#[allow(unused_imports)]
use form::*;
#[allow(unused_imports)]
use navigate::*;

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    app.banner = None;
    let key = normalize_key(key);

    if !app.is_signed_in() {
        handle_login(app, key);
        return;
    }

    // Help overlay swallows the key that closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match app.mode {
        Mode::Navigate => handle_navigate(app, key),
        Mode::Search => handle_search(app, key),
        Mode::EditDescription => handle_edit_description(app, key),
        Mode::EditProperty(field) => handle_edit_property(app, field, key),
        Mode::EditCriterion(index) => handle_edit_criterion(app, index, key),
        Mode::NewTask => handle_new_task(app, key),
        Mode::ConfirmDelete => handle_confirm_delete(app, key),
    }
}

pub fn handle_mouse(app: &mut App, event: MouseEvent) {
    if !app.is_signed_in() || app.show_help {
        return;
    }
    mouse::handle_mouse(app, event);
}

/// Handle a bracketed paste: the text goes into whichever input has focus.
pub fn handle_paste(app: &mut App, text: &str) {
    if text.is_empty() {
        return;
    }
    if !app.is_signed_in() {
        app.login.current_input_mut().insert_str(text);
        return;
    }
    match app.mode {
        Mode::Search => app.search_input.insert_str(text),
        Mode::EditDescription | Mode::EditProperty(_) | Mode::EditCriterion(_) => {
            app.editor.insert_str(text)
        }
        Mode::NewTask => {
            if let Some(form) = app.new_task.as_mut()
                && !form.current_field().is_choice()
            {
                form.input.insert_str(text);
            }
        }
        Mode::Navigate | Mode::ConfirmDelete => {}
    }
}
