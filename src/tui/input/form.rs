use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::form::{DraftField, FormError};
use crate::tui::app::{App, LoginScreen, Mode, NewTaskForm, Request};
use crate::tui::editor::TextInput;

use super::*;

// ---------------------------------------------------------------------------
// Sign-in screen

pub(super) fn handle_login(app: &mut App, key: KeyEvent) {
    if is_ctrl(&key, 'c') || key.code == KeyCode::Esc {
        app.should_quit = true;
        return;
    }
    if is_ctrl(&key, 'r') {
        let register = !app.login.register;
        app.login = LoginScreen {
            register,
            ..LoginScreen::default()
        };
        return;
    }
    let count = app.login.fields().len();
    match key.code {
        KeyCode::Tab | KeyCode::Down => app.login.field = (app.login.field + 1) % count,
        KeyCode::BackTab | KeyCode::Up => app.login.field = (app.login.field + count - 1) % count,
        KeyCode::Enter => submit_login(app),
        _ => {
            edit_text(app.login.current_input_mut(), key);
        }
    }
}

fn submit_login(app: &mut App) {
    let login = &app.login;
    if !login.register && !login.oauth.is_empty() {
        let redirect = login.oauth.text().to_string();
        app.request(Request::OAuth(redirect));
        return;
    }
    let result: Result<Request, FormError> = if login.register {
        let form = login.register_form();
        form.validate().map(|()| Request::Register(form))
    } else {
        let form = login.login_form();
        form.validate().map(|()| Request::Login(form))
    };
    match result {
        Ok(req) => app.request(req),
        Err(e) => app.set_error(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// New-task form

pub(super) fn handle_new_task(app: &mut App, key: KeyEvent) {
    let Some(form) = app.new_task.as_mut() else {
        app.mode = Mode::Navigate;
        return;
    };
    let field = form.current_field();
    match key.code {
        KeyCode::Esc => {
            app.new_task = None;
            app.mode = Mode::Navigate;
        }
        KeyCode::Tab | KeyCode::Down => move_field(form, 1),
        KeyCode::BackTab | KeyCode::Up => move_field(form, -1),
        KeyCode::Enter => submit_new_task(app),
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if field.is_choice() => {
            form.draft.cycle(field);
        }
        _ if !field.is_choice() => {
            edit_text(&mut form.input, key);
        }
        _ => {}
    }
}

/// Write the typed text back to the draft. On a parse error the form keeps
/// the text and shows the error.
fn commit_field(form: &mut NewTaskForm) -> bool {
    let field = form.current_field();
    if field.is_choice() {
        return true;
    }
    match form.draft.set_field(field, form.input.text()) {
        Ok(()) => {
            form.error = None;
            true
        }
        Err(e) => {
            form.error = Some(e.to_string());
            false
        }
    }
}

fn move_field(form: &mut NewTaskForm, delta: isize) {
    if !commit_field(form) {
        return;
    }
    let len = DraftField::ALL.len() as isize;
    form.field = (form.field as isize + delta).rem_euclid(len) as usize;
    let text = form.draft.field_text(form.current_field());
    form.input = TextInput::single_line(&text);
}

fn submit_new_task(app: &mut App) {
    let now = app.now();
    let Some(form) = app.new_task.as_mut() else {
        return;
    };
    if !commit_field(form) {
        return;
    }
    match form.draft.clone().into_task(now) {
        Ok(task) => {
            app.new_task = None;
            app.mode = Mode::Navigate;
            app.request(Request::CreateTask(task));
        }
        Err(e) => form.error = Some(e.to_string()),
    }
}
