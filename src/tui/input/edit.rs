use crossterm::event::{KeyCode, KeyEvent};

use crate::model::task::{TaskId, parse_date};
use crate::ops::workspace::TaskEditor;
use crate::tui::app::{App, Mode, PropField, Request};

use super::*;

// ---------------------------------------------------------------------------
// Search

/// Typing filters the explorer live; Enter keeps the filter, Esc restores
/// the previous one.
pub(super) fn handle_search(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.mode = Mode::Navigate,
        KeyCode::Enter => {
            app.explorer.query = app.search_input.text().to_string();
            app.explorer.cursor = 0;
            app.mode = Mode::Navigate;
        }
        _ => {
            edit_text(&mut app.search_input, key);
            app.explorer.cursor = 0;
        }
    }
    let rows = app.explorer_rows().len();
    app.explorer.clamp_cursor(rows);
}

// ---------------------------------------------------------------------------
// Description

pub(super) fn handle_edit_description(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc || is_ctrl(&key, 's') {
        save_description(app);
        return;
    }
    edit_text(&mut app.editor, key);
}

fn save_description(app: &mut App) {
    app.mode = Mode::Navigate;
    let text = app.editor.text().to_string();
    if app.workspace.description() == Some(text.as_str()) {
        return;
    }
    match app.workspace.set_description(text) {
        Ok(()) => app.edit_active(|_| {}),
        Err(e) => app.set_error(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Acceptance criteria

/// Enter saves, Tab and Shift+Tab save and move to the neighbouring
/// criterion, Esc drops the change.
pub(super) fn handle_edit_criterion(app: &mut App, index: usize, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.mode = Mode::Navigate,
        KeyCode::Enter => {
            save_criterion(app, index);
            app.mode = Mode::Navigate;
        }
        KeyCode::Tab | KeyCode::Down => {
            save_criterion(app, index);
            begin_criterion_edit(app, index + 1);
        }
        KeyCode::BackTab | KeyCode::Up => {
            save_criterion(app, index);
            begin_criterion_edit(app, index.saturating_sub(1));
        }
        _ => {
            edit_text(&mut app.editor, key);
        }
    }
}

fn save_criterion(app: &mut App, index: usize) {
    let text = app.editor.text().trim().to_string();
    let unchanged = app
        .workspace
        .active_task()
        .and_then(|t| t.acceptance_criteria.get(index))
        .is_none_or(|current| *current == text);
    if unchanged {
        return;
    }
    app.edit_active(|t| {
        if let Some(item) = t.acceptance_criteria.get_mut(index) {
            *item = text;
        }
    });
}

// ---------------------------------------------------------------------------
// Text properties

pub(super) fn handle_edit_property(app: &mut App, field: PropField, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.mode = Mode::Navigate,
        KeyCode::Enter => {
            let text = app.editor.text().to_string();
            match apply_property(app, field, &text) {
                Ok(()) => app.mode = Mode::Navigate,
                // Stay in the editor so the value can be fixed
                Err(msg) => app.set_error(msg),
            }
        }
        _ => {
            edit_text(&mut app.editor, key);
        }
    }
}

/// Validate and apply a typed property value to the active task
pub(super) fn apply_property(app: &mut App, field: PropField, text: &str) -> Result<(), String> {
    let trimmed = text.trim();
    match field {
        PropField::Assignee => {
            let assignee = (!trimmed.is_empty()).then(|| trimmed.to_string());
            app.edit_active(|t| t.assignee = assignee);
        }
        PropField::DueDate => {
            let date = if trimmed.is_empty() {
                None
            } else {
                Some(parse_date(trimmed).ok_or_else(|| {
                    format!("invalid date '{}' (expected YYYY-MM-DD)", trimmed)
                })?)
            };
            if app.workspace.due_date() != date {
                app.workspace.set_due_date(date).map_err(|e| e.to_string())?;
                app.edit_active(|_| {});
            }
        }
        PropField::Labels => {
            let labels = split_list(trimmed);
            app.edit_active(|t| {
                t.labels.clear();
                for label in &labels {
                    t.add_label(label);
                }
            });
        }
        PropField::Dependencies => {
            let ids: Vec<TaskId> = split_list(trimmed).into_iter().map(TaskId::new).collect();
            if let Some(unknown) = ids.iter().find(|id| app.workspace.task(id).is_none()) {
                return Err(format!("unknown task: {}", unknown));
            }
            app.edit_active(|t| {
                t.dependencies.clear();
                for id in ids {
                    t.add_dependency(id);
                }
            });
        }
        _ => {}
    }
    Ok(())
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Delete confirmation

pub(super) fn handle_confirm_delete(app: &mut App, key: KeyEvent) {
    app.mode = Mode::Navigate;
    if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'))
        && let Some(id) = app.workspace.active_id().cloned()
    {
        app.request(Request::DeleteTask(id));
    }
}
