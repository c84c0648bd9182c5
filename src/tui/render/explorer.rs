use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::explorer::{ExplorerRow, GROUPS, row_task};
use crate::tui::app::{App, Focus};
use crate::util::unicode::{display_width, truncate_to_width};

use super::{panel_block, push_highlighted_spans, scroll_to_cursor};

/// Render the explorer: task groups with their tasks, filtered by the search
pub fn render_explorer(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = panel_block(app, "Explorer", Focus::Explorer);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let query = app.explorer_query();
    let groups = app.groups();
    let rows = app.explorer.rows(&groups);
    let height = inner.height as usize;
    let width = inner.width as usize;
    let cursor = app.explorer.cursor.min(rows.len().saturating_sub(1));
    let scroll = scroll_to_cursor(app.explorer.scroll_offset, cursor, height);
    let focused = app.focus == Focus::Explorer;
    let active = app.workspace.active_id();
    let bg = app.theme.background;

    let mut lines: Vec<Line> = Vec::new();
    if rows.iter().all(|r| matches!(r, ExplorerRow::Group { count: 0, .. })) && query.is_some() {
        lines.push(Line::from(Span::styled(
            " no matches",
            Style::default().fg(app.theme.dim).bg(bg),
        )));
    }

    for (i, row) in rows.iter().enumerate().skip(scroll).take(height) {
        let selected = focused && i == cursor;
        let row_bg = if selected { app.theme.selection_bg } else { bg };
        let mut spans: Vec<Span> = Vec::new();
        match row {
            ExplorerRow::Group {
                id,
                expanded,
                count,
            } => {
                let title = GROUPS
                    .iter()
                    .find(|(gid, _, _)| gid == id)
                    .map_or(*id, |(_, title, _)| *title);
                let arrow = if *expanded { "\u{25BE}" } else { "\u{25B8}" };
                let style = Style::default()
                    .fg(app.theme.text_bright)
                    .bg(row_bg)
                    .add_modifier(Modifier::BOLD);
                let label =
                    truncate_to_width(&format!("{} {}", arrow, title), width.saturating_sub(5));
                spans.push(Span::styled(label, style));
                spans.push(Span::styled(
                    format!(" ({})", count),
                    Style::default().fg(app.theme.dim).bg(row_bg),
                ));
            }
            ExplorerRow::Task { .. } => {
                let Some(task) = row_task(&groups, row) else {
                    continue;
                };
                let is_active = active == Some(&task.id);
                spans.push(Span::styled("  ", Style::default().bg(row_bg)));
                spans.push(Span::styled(
                    "\u{25CF} ",
                    Style::default()
                        .fg(app.theme.status_color(task.status))
                        .bg(row_bg),
                ));
                let mut base = Style::default().fg(app.theme.text).bg(row_bg);
                if is_active {
                    base = base.fg(app.theme.text_bright).add_modifier(Modifier::BOLD);
                }
                let hl = Style::default()
                    .fg(app.theme.search_match_fg)
                    .bg(app.theme.search_match_bg);
                let title = truncate_to_width(&task.title, width.saturating_sub(4));
                push_highlighted_spans(&mut spans, &title, base, hl, query.as_ref());
            }
        }
        // Pad so the selection background spans the row
        let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
        if used < width {
            spans.push(Span::styled(" ".repeat(width - used), Style::default().bg(row_bg)));
        }
        lines.push(Line::from(spans));
    }

    app.explorer.scroll_offset = scroll;
    frame.render_widget(Paragraph::new(lines), inner);
}
