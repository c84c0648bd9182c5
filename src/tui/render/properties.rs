use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::task::{Task, format_datetime};
use crate::tui::app::{App, Focus, Mode, PropField};
use crate::util::unicode::{display_width, truncate_to_width};

use super::panel_block;

/// Width of the field name column
const LABEL_WIDTH: usize = 11;

/// Render the properties of the active task, one field per row
pub fn render_properties(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel_block(app, "Properties", Focus::Properties);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let bg = app.theme.background;
    let dim = Style::default().fg(app.theme.dim).bg(bg);
    let Some(task) = app.workspace.active_task() else {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(" No task selected", dim))),
            inner,
        );
        return;
    };

    let width = inner.width as usize;
    let value_width = width.saturating_sub(LABEL_WIDTH + 1);
    let focused = app.focus == Focus::Properties;
    let mut lines: Vec<Line> = Vec::new();

    for (i, field) in PropField::ALL.iter().enumerate() {
        let selected = focused && i == app.prop_cursor;
        let row_bg = if selected { app.theme.selection_bg } else { bg };
        let label = format!(" {:<w$}", field.label(), w = LABEL_WIDTH);
        let mut spans = vec![Span::styled(
            truncate_to_width(&label, width),
            Style::default().fg(app.theme.dim).bg(row_bg),
        )];

        if app.mode == Mode::EditProperty(*field) {
            spans.push(Span::styled(
                app.editor.text().to_string(),
                Style::default().fg(app.theme.text_bright).bg(row_bg),
            ));
            let (_, col) = app.editor.cursor_position();
            let x = inner.x as usize + LABEL_WIDTH + 1 + col;
            if x < (inner.x + inner.width) as usize && (i as u16) < inner.height {
                frame.set_cursor_position(Position::new(x as u16, inner.y + i as u16));
            }
        } else {
            spans.extend(value_spans(app, task, *field, value_width, row_bg));
        }

        let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
        if used < width {
            spans.push(Span::styled(" ".repeat(width - used), Style::default().bg(row_bg)));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    for (name, stamp) in [("Created", task.created_at), ("Updated", task.updated_at)] {
        if let Some(stamp) = stamp {
            lines.push(Line::from(vec![
                Span::styled(format!(" {:<w$}", name, w = LABEL_WIDTH), dim),
                Span::styled(
                    truncate_to_width(&format_datetime(&stamp).replace('T', " "), value_width),
                    dim,
                ),
            ]));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn value_spans(
    app: &App,
    task: &Task,
    field: PropField,
    width: usize,
    bg: Color,
) -> Vec<Span<'static>> {
    let plain = |text: String, fg: Color| {
        Span::styled(
            truncate_to_width(&text, width),
            Style::default().fg(fg).bg(bg),
        )
    };
    let text = app.property_text(task, field);
    match field {
        PropField::Status => vec![plain(text, app.theme.status_color(task.status))],
        PropField::Priority => vec![plain(text, app.theme.priority_color(task.priority))],
        PropField::Labels if !task.labels.is_empty() => {
            // Each label in its own color, stopping when the row is full
            let mut spans = Vec::new();
            let mut used = 0;
            for (i, label) in task.labels.iter().enumerate() {
                let piece = if i == 0 {
                    label.clone()
                } else {
                    format!(" {}", label)
                };
                let w = display_width(&piece);
                if used + w > width {
                    spans.push(plain("\u{2026}".into(), app.theme.dim));
                    break;
                }
                used += w;
                spans.push(Span::styled(
                    piece,
                    Style::default().fg(app.theme.label_color(label)).bg(bg),
                ));
            }
            spans
        }
        PropField::DueDate if task.is_overdue(app.now().date()) => {
            vec![plain(text, app.theme.red)]
        }
        _ if text.is_empty() => vec![plain("\u{2014}".into(), app.theme.dim)],
        _ => vec![plain(text, app.theme.text)],
    }
}
