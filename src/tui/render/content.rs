use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::model::task::Task;
use crate::tui::app::{App, Focus, Mode};

use super::{panel_block, scroll_to_cursor, tab_bar};

/// Render the content panel: tab strip over the active task's document
pub fn render_content(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = match app.workspace.active_task() {
        Some(task) => format!("#{}", task.id),
        None => "Tasks".to_string(),
    };
    let block = panel_block(app, &title, Focus::Content);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);
    tab_bar::render_tab_bar(frame, app, chunks[0]);

    let body = chunks[1];
    let Some(task) = app.workspace.active_task().cloned() else {
        render_empty(frame, app, body);
        return;
    };

    if app.mode == Mode::EditDescription {
        render_editor(frame, app, &task, body);
        return;
    }

    let lines = document_lines(app, &task);
    // Clamp so scrolling past the end stops at the last line
    let max_scroll = lines.len().saturating_sub(1);
    app.content_scroll = app.content_scroll.min(max_scroll);
    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(app.theme.background))
        .wrap(Wrap { trim: false })
        .scroll((app.content_scroll as u16, 0));
    frame.render_widget(paragraph, body);
}

fn render_empty(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(app.theme.dim).bg(app.theme.background);
    let hint = if app.workspace.tasks().is_empty() {
        " No tasks yet. Press n to create one."
    } else {
        " Select a task in the explorer, or press n to create one."
    };
    let lines = vec![Line::from(""), Line::from(Span::styled(hint, dim))];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn document_lines<'a>(app: &App, task: &'a Task) -> Vec<Line<'a>> {
    let bg = app.theme.background;
    let text = Style::default().fg(app.theme.text).bg(bg);
    let dim = Style::default().fg(app.theme.dim).bg(bg);
    let header = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(task.title.as_str(), header)),
        Line::from(vec![
            Span::styled(
                task.status.label(),
                Style::default().fg(app.theme.status_color(task.status)).bg(bg),
            ),
            Span::styled(" \u{00B7} ", dim),
            Span::styled(
                task.priority.as_str(),
                Style::default()
                    .fg(app.theme.priority_color(task.priority))
                    .bg(bg),
            ),
        ]),
        Line::from(""),
    ];

    if task.description.is_empty() {
        lines.push(Line::from(Span::styled("No description. Press i to write one.", dim)));
    } else {
        lines.extend(
            task.description
                .lines()
                .map(|l| Line::from(Span::styled(l, text))),
        );
    }

    if !task.acceptance_criteria.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Acceptance criteria", header)));
        let editing = match app.mode {
            Mode::EditCriterion(index) => Some(index),
            _ => None,
        };
        for (i, item) in task.acceptance_criteria.iter().enumerate() {
            if editing == Some(i) {
                let active = Style::default().fg(app.theme.highlight).bg(bg);
                lines.push(Line::from(vec![
                    Span::styled("  \u{25B8} ", active),
                    Span::styled(app.editor.text().to_string(), active),
                    Span::styled("\u{258C}", active),
                ]));
            } else {
                lines.push(Line::from(vec![
                    Span::styled("  \u{2610} ", dim),
                    Span::styled(item.as_str(), text),
                ]));
            }
        }
    }

    if !task.activity.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Activity", header)));
        for entry in &task.activity {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {}", entry.user),
                    Style::default().fg(app.theme.accent).bg(bg),
                ),
                Span::styled(format!(" \u{00B7} {}", entry.date), dim),
            ]));
            lines.push(Line::from(Span::styled(format!("    {}", entry.comment), text)));
        }
    }
    lines
}

/// Multi-line description editor with a terminal cursor
fn render_editor(frame: &mut Frame, app: &App, task: &Task, area: Rect) {
    let bg = app.theme.background;
    let header = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let text = Style::default().fg(app.theme.text_bright).bg(bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area);
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled(task.title.as_str(), header)),
            Line::from(Span::styled(
                "editing description (Esc to save)",
                Style::default().fg(app.theme.highlight).bg(bg),
            )),
        ]),
        chunks[0],
    );

    let editor_area = chunks[1];
    let (cursor_line, cursor_col) = app.editor.cursor_position();
    let height = editor_area.height as usize;
    let scroll = scroll_to_cursor(0, cursor_line, height);
    let lines: Vec<Line> = app
        .editor
        .lines()
        .into_iter()
        .map(|l| Line::from(Span::styled(l.to_string(), text)))
        .collect();
    frame.render_widget(
        Paragraph::new(lines).scroll((scroll as u16, 0)),
        editor_area,
    );

    if height > 0 && (cursor_col as u16) < editor_area.width {
        frame.set_cursor_position(Position::new(
            editor_area.x + cursor_col as u16,
            editor_area.y + (cursor_line - scroll) as u16,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{ActivityEntry, TaskId};
    use crate::tui::editor::TextInput;
    use crate::tui::render::test_helpers::*;

    fn render(app: &mut App) -> String {
        render_to_string(50, 16, |frame, area| render_content(frame, app, area))
    }

    #[test]
    fn empty_workspace_hint() {
        let mut app = app_with_tasks(sample_tasks());
        let output = render(&mut app);
        assert!(output.contains("Select a task in the explorer"));
        assert!(output.contains("No open tasks"));
    }

    #[test]
    fn active_task_document() {
        let mut app = app_with_tasks(sample_tasks());
        app.open_task(&TaskId::new("1"));
        app.workspace
            .modify_task(&TaskId::new("1"), |t| {
                t.acceptance_criteria = vec!["Form validates".into()];
                t.activity = vec![ActivityEntry {
                    user: "grace".into(),
                    date: "2025-03-09".into(),
                    comment: "Looks good".into(),
                }];
            })
            .unwrap();
        let output = render(&mut app);
        assert!(output.contains("#1"));
        assert!(output.contains("in progress \u{00B7} high"));
        assert!(output.contains("Build the login form."));
        assert!(output.contains("Support OAuth."));
        assert!(output.contains("\u{2610} Form validates"));
        assert!(output.contains("grace \u{00B7} 2025-03-09"));
    }

    #[test]
    fn criterion_being_edited_shows_buffer() {
        let mut app = app_with_tasks(sample_tasks());
        app.open_task(&TaskId::new("1"));
        app.workspace
            .modify_task(&TaskId::new("1"), |t| {
                t.acceptance_criteria = vec!["Form validates".into(), "Errors shown".into()];
            })
            .unwrap();
        app.mode = Mode::EditCriterion(1);
        app.editor = TextInput::single_line("Errors shown inline");
        let output = render(&mut app);
        assert!(output.contains("\u{2610} Form validates"));
        assert!(output.contains("\u{25B8} Errors shown inline\u{258C}"));
    }

    #[test]
    fn scroll_is_clamped() {
        let mut app = app_with_tasks(sample_tasks());
        app.open_task(&TaskId::new("3"));
        app.content_scroll = 100;
        let _ = render(&mut app);
        // Title, meta line, blank, placeholder
        assert_eq!(app.content_scroll, 3);
    }

    #[test]
    fn editor_shows_buffer() {
        let mut app = app_with_tasks(sample_tasks());
        app.open_task(&TaskId::new("3"));
        app.mode = Mode::EditDescription;
        app.editor = TextInput::multi_line("draft text\nsecond");
        let output = render(&mut app);
        assert!(output.contains("editing description"));
        assert!(output.contains("draft text"));
        assert!(output.contains("second"));
    }
}
