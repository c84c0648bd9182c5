use crossterm::event::{KeyCode, KeyEvent};

use crate::model::task::{STORY_POINTS, TaskId};
use crate::ops::explorer::{ExplorerRow, row_task};
use crate::ops::layout::Panel;
use crate::tui::app::{App, Focus, Mode, NewTaskForm, PropField, Request};
use crate::tui::editor::TextInput;

use super::*;

/// Percent added or removed per `<`/`>` press
const RESIZE_STEP: u16 = 2;

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    if is_ctrl(&key, 'c') {
        app.should_quit = true;
        return;
    }
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Tab => app.cycle_focus(1),
        KeyCode::BackTab => app.cycle_focus(-1),
        KeyCode::Char('E') => app.toggle_panel(Panel::Explorer),
        KeyCode::Char('P') => app.toggle_panel(Panel::Properties),
        KeyCode::Char('T') => app.toggle_panel(Panel::Timeline),
        KeyCode::Char('<') => resize_focused(app, false),
        KeyCode::Char('>') => resize_focused(app, true),
        KeyCode::Char('n') => open_new_task_form(app),
        KeyCode::Char('r') => app.request(Request::LoadTasks),
        KeyCode::Char('D') => {
            if app.workspace.active_id().is_some() {
                app.mode = Mode::ConfirmDelete;
            }
        }
        KeyCode::Char('[') => step_tab(app, -1),
        KeyCode::Char(']') => step_tab(app, 1),
        KeyCode::Char('x') => close_active_tab(app),
        KeyCode::Char('L') => {
            let mode = app.theme.mode.toggle();
            app.set_theme(mode);
        }
        KeyCode::Char('O') => {
            app.sign_out();
            app.set_info("Signed out");
        }
        KeyCode::Char('/') => {
            app.search_input = TextInput::single_line(&app.explorer.query);
            app.focus = Focus::Explorer;
            if !app.layout.is_visible(Panel::Explorer) {
                app.layout.toggle(Panel::Explorer);
            }
            app.mode = Mode::Search;
        }
        KeyCode::Esc if !app.explorer.query.is_empty() => {
            app.explorer.query.clear();
            let rows = app.explorer_rows().len();
            app.explorer.clamp_cursor(rows);
        }
        _ => match app.focus {
            Focus::Explorer => handle_explorer(app, key),
            Focus::Content => handle_content(app, key),
            Focus::Properties => handle_properties(app, key),
            Focus::Timeline => handle_timeline(app, key),
        },
    }
}

fn resize_focused(app: &mut App, grow: bool) {
    let Some(panel) = app.focus.panel() else {
        return;
    };
    let size = app.layout.size(panel);
    let target = if grow {
        size.saturating_add(RESIZE_STEP)
    } else {
        size.saturating_sub(RESIZE_STEP)
    };
    app.layout.set_size(panel, target);
}

fn open_new_task_form(app: &mut App) {
    app.new_task = Some(NewTaskForm::default());
    app.mode = Mode::NewTask;
}

fn step_tab(app: &mut App, delta: isize) {
    let ids = app.workspace.open_ids();
    if ids.is_empty() {
        return;
    }
    let current = app.workspace.active_index().unwrap_or(0);
    let next = (current as isize + delta).rem_euclid(ids.len() as isize) as usize;
    let id = ids[next].clone();
    if app.workspace.select_tab(&id).is_ok() {
        app.content_scroll = 0;
    }
}

fn close_active_tab(app: &mut App) {
    if let Some(id) = app.workspace.active_id().cloned() {
        app.workspace.close_tab(&id);
        app.content_scroll = 0;
    }
}

// ---------------------------------------------------------------------------
// Explorer

fn handle_explorer(app: &mut App, key: KeyEvent) {
    let rows = app.explorer_rows();
    if rows.is_empty() {
        return;
    }
    let last = rows.len() - 1;
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.explorer.cursor = (app.explorer.cursor + 1).min(last);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.explorer.cursor = app.explorer.cursor.saturating_sub(1);
        }
        KeyCode::Char('g') | KeyCode::Home => app.explorer.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => app.explorer.cursor = last,
        KeyCode::Char(' ') | KeyCode::Char('l') | KeyCode::Right => {
            activate_explorer_row(app);
        }
        KeyCode::Enter => {
            if activate_explorer_row(app) {
                app.focus = Focus::Content;
            }
        }
        KeyCode::Char('h') | KeyCode::Left => collapse_explorer_row(app, &rows),
        _ => {}
    }
}

/// Toggle the group or open the task under the cursor. Returns true if a task
/// was opened.
pub(super) fn activate_explorer_row(app: &mut App) -> bool {
    let rows = app.explorer_rows();
    let Some(row) = rows.get(app.explorer.cursor) else {
        return false;
    };
    match row {
        ExplorerRow::Group { id, .. } => {
            app.explorer.toggle(id);
            let count = app.explorer_rows().len();
            app.explorer.clamp_cursor(count);
            false
        }
        ExplorerRow::Task { .. } => {
            let id: Option<TaskId> = row_task(&app.groups(), row).map(|t| t.id.clone());
            match id {
                Some(id) => {
                    app.open_task(&id);
                    true
                }
                None => false,
            }
        }
    }
}

fn collapse_explorer_row(app: &mut App, rows: &[ExplorerRow]) {
    let Some(row) = rows.get(app.explorer.cursor) else {
        return;
    };
    let group_id = match row {
        ExplorerRow::Group { id, expanded, .. } => expanded.then_some(*id),
        ExplorerRow::Task { group, .. } => Some(*group),
    };
    let Some(group_id) = group_id else {
        return;
    };
    if let Some(pos) = rows
        .iter()
        .position(|r| matches!(r, ExplorerRow::Group { id, .. } if *id == group_id))
    {
        app.explorer.cursor = pos;
    }
    if app.explorer.is_expanded(group_id) {
        app.explorer.toggle(group_id);
    }
}

// ---------------------------------------------------------------------------
// Content

fn handle_content(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.content_scroll += 1,
        KeyCode::Char('k') | KeyCode::Up => {
            app.content_scroll = app.content_scroll.saturating_sub(1);
        }
        KeyCode::Char('g') | KeyCode::Home => app.content_scroll = 0,
        KeyCode::Enter | KeyCode::Char('i') => begin_description_edit(app),
        KeyCode::Char('c') => begin_criterion_edit(app, 0),
        _ => {}
    }
}

fn begin_description_edit(app: &mut App) {
    let Some(task) = app.workspace.active_task() else {
        return;
    };
    app.editor = TextInput::multi_line(&task.description);
    app.mode = Mode::EditDescription;
}

/// Edit criterion `index` of the active task, clamped to the last one.
/// Tasks without criteria leave the mode alone.
pub(super) fn begin_criterion_edit(app: &mut App, index: usize) {
    let Some(task) = app.workspace.active_task() else {
        return;
    };
    let Some(last) = task.acceptance_criteria.len().checked_sub(1) else {
        return;
    };
    let index = index.min(last);
    app.editor = TextInput::single_line(&task.acceptance_criteria[index]);
    app.mode = Mode::EditCriterion(index);
}

// ---------------------------------------------------------------------------
// Properties

fn handle_properties(app: &mut App, key: KeyEvent) {
    let last = PropField::ALL.len() - 1;
    let field = PropField::ALL[app.prop_cursor.min(last)];
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.prop_cursor = (app.prop_cursor + 1).min(last),
        KeyCode::Char('k') | KeyCode::Up => app.prop_cursor = app.prop_cursor.saturating_sub(1),
        KeyCode::Char('l') | KeyCode::Right if field.is_choice() => cycle_property(app, field, 1),
        KeyCode::Char('h') | KeyCode::Left if field.is_choice() => cycle_property(app, field, -1),
        KeyCode::Enter | KeyCode::Char(' ') => {
            if field.is_choice() {
                cycle_property(app, field, 1);
            } else if let Some(task) = app.workspace.active_task() {
                let text = app.property_text(task, field);
                app.editor = TextInput::single_line(&text);
                app.mode = Mode::EditProperty(field);
            }
        }
        _ => {}
    }
}

/// Step a choice property forward or back and save
pub(super) fn cycle_property(app: &mut App, field: PropField, delta: i32) {
    let category_ids: Vec<u64> = app.categories.iter().map(|c| c.id).collect();
    app.edit_active(|task| match field {
        PropField::Status => {
            let next = if delta > 0 {
                task.status.next()
            } else {
                task.status.prev()
            };
            task.set_status(next);
        }
        PropField::Priority => {
            task.priority = if delta > 0 {
                task.priority.next()
            } else {
                task.priority.prev()
            };
        }
        PropField::StoryPoints => {
            task.story_points = step_option(&STORY_POINTS, task.story_points, delta);
        }
        PropField::Category => {
            task.category_id = step_option(&category_ids, task.category_id, delta);
        }
        _ => {}
    });
}

/// Cycle through `None` and each choice in order, wrapping both ways
fn step_option<T: Copy + PartialEq>(choices: &[T], current: Option<T>, delta: i32) -> Option<T> {
    if choices.is_empty() {
        return None;
    }
    // Slot 0 is None; slots 1..=len are the choices
    let slots = choices.len() as i32 + 1;
    let slot = current
        .and_then(|c| choices.iter().position(|x| *x == c))
        .map_or(0, |i| i as i32 + 1);
    let next = (slot + delta).rem_euclid(slots);
    if next == 0 {
        None
    } else {
        Some(choices[next as usize - 1])
    }
}

// ---------------------------------------------------------------------------
// Timeline

fn handle_timeline(app: &mut App, key: KeyEvent) {
    let bars = app.timeline_bars();
    if bars.is_empty() {
        return;
    }
    let last = bars.len() - 1;
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.timeline_cursor = (app.timeline_cursor + 1).min(last);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.timeline_cursor = app.timeline_cursor.saturating_sub(1);
        }
        KeyCode::Enter => {
            if let Some(bar) = bars.get(app.timeline_cursor.min(last)) {
                app.open_task(&bar.id);
                app.focus = Focus::Content;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::{app_with_fake, app_with_tasks, sample_tasks};
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn step_option_wraps_through_none() {
        let choices = [1, 2, 3];
        assert_eq!(step_option(&choices, None, 1), Some(1));
        assert_eq!(step_option(&choices, Some(3), 1), None);
        assert_eq!(step_option(&choices, None, -1), Some(3));
        assert_eq!(step_option(&choices, Some(9), 1), Some(1));
        assert_eq!(step_option::<u32>(&[], Some(1), 1), None);
    }

    #[test]
    fn explorer_enter_opens_task_and_focuses_content() {
        let mut app = app_with_tasks(sample_tasks());
        // Row 0 is the expanded Current Sprint group, row 1 its first task
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.workspace.active_id(), Some(&TaskId::new("1")));
        assert_eq!(app.focus, Focus::Content);
    }

    #[test]
    fn explorer_toggles_groups() {
        let mut app = app_with_tasks(sample_tasks());
        assert_eq!(app.explorer_rows().len(), 5);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.explorer_rows().len(), 3);
        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Char('l'));
        // Done group expanded
        assert_eq!(app.explorer_rows().len(), 4);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.explorer_rows().len(), 3);
        assert_eq!(app.explorer.cursor, 2);
    }

    #[test]
    fn tabs_cycle_and_close() {
        let mut app = app_with_tasks(sample_tasks());
        for id in ["1", "2", "3"] {
            app.open_task(&TaskId::new(id));
        }
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.workspace.active_id(), Some(&TaskId::new("1")));
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.workspace.active_id(), Some(&TaskId::new("3")));
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.workspace.open_ids().len(), 2);
        assert_eq!(app.workspace.active_id(), Some(&TaskId::new("2")));
    }

    #[test]
    fn status_cycles_and_queues_save() {
        let mut app = app_with_tasks(sample_tasks());
        app.open_task(&TaskId::new("3"));
        app.focus = Focus::Properties;
        press(&mut app, KeyCode::Enter);
        let task = app.workspace.active_task().unwrap();
        assert_eq!(task.status, crate::model::task::TaskStatus::InProgress);
        assert_eq!(app.pending, Some(Request::SaveTask(TaskId::new("3"))));
    }

    #[test]
    fn text_property_enters_edit_mode() {
        let mut app = app_with_tasks(sample_tasks());
        app.open_task(&TaskId::new("1"));
        app.focus = Focus::Properties;
        app.prop_cursor = 3;
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::EditProperty(PropField::Assignee));
        assert_eq!(app.editor.text(), "ada");
    }

    #[test]
    fn criterion_edit_reaches_both_collections() {
        let (mut app, fake) = app_with_fake(sample_tasks());
        let id = TaskId::new("1");
        app.workspace
            .modify_task(&id, |t| {
                t.acceptance_criteria = vec!["Form validates".into(), "Errors shown".into()];
            })
            .unwrap();
        app.open_task(&id);
        app.focus = Focus::Content;

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.mode, Mode::EditCriterion(0));
        assert_eq!(app.editor.text(), "Form validates");
        press(&mut app, KeyCode::Char('!'));
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.mode, Mode::EditCriterion(1));
        assert_eq!(app.editor.text(), "Errors shown");
        assert_eq!(app.pending, Some(Request::SaveTask(id.clone())));

        // Esc drops the change to the second criterion
        press(&mut app, KeyCode::Char('?'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Navigate);

        let expected = vec!["Form validates!".to_string(), "Errors shown".to_string()];
        assert_eq!(app.workspace.task(&id).unwrap().acceptance_criteria, expected);
        assert_eq!(app.workspace.open_tasks()[0].acceptance_criteria, expected);
        app.perform_pending();
        assert_eq!(fake.saved.borrow()[0].acceptance_criteria, expected);
    }

    #[test]
    fn criterion_edit_needs_criteria() {
        let mut app = app_with_tasks(sample_tasks());
        app.open_task(&TaskId::new("3"));
        app.focus = Focus::Content;
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.mode, Mode::Navigate);
    }

    #[test]
    fn resize_keys_clamp() {
        let mut app = app_with_tasks(sample_tasks());
        for _ in 0..20 {
            press(&mut app, KeyCode::Char('>'));
        }
        assert_eq!(app.layout.size(Panel::Explorer), 30);
        app.focus = Focus::Content;
        press(&mut app, KeyCode::Char('<'));
        assert_eq!(app.layout.size(Panel::Explorer), 30);
    }

    #[test]
    fn search_slash_enters_search_mode() {
        let mut app = app_with_tasks(sample_tasks());
        app.focus = Focus::Timeline;
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.mode, Mode::Search);
        assert_eq!(app.focus, Focus::Explorer);
    }
}
