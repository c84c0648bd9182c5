use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::timeline::today_offset;
use crate::tui::app::{App, Focus};
use crate::util::unicode::{display_width, truncate_to_width};

use super::{panel_block, scroll_to_cursor};

/// One styled terminal cell
type Cell = (char, Style);

/// Render the timeline: a day axis and one bar per dated task
pub fn render_timeline(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = panel_block(app, "Timeline", Focus::Timeline);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let bg = app.theme.background;
    let width = inner.width as usize;
    let scale = app.timeline_scale();
    let axis = app.timeline_axis();
    let bars = app.timeline_bars();
    let label_width = scale.label_width.max(0) as usize;
    let unit = scale.unit_per_day.max(1) as usize;
    let today_col = usize::try_from(today_offset(app.now(), &axis, &scale)).ok();

    let mut lines: Vec<Line> = Vec::with_capacity(inner.height as usize);

    // Axis header
    let mut header: Vec<Cell> = vec![(' ', Style::default().bg(bg)); width];
    put_str(&mut header, 0, " Task", Style::default().fg(app.theme.dim).bg(bg));
    let date_format = if unit >= 7 { "%a %d" } else { "%d" };
    for (i, day) in axis.iter().enumerate() {
        let col = label_width + i * unit;
        let is_today = Some(col) == today_col;
        let style = if is_today {
            Style::default()
                .fg(app.theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.dim).bg(bg)
        };
        let text = day.format(date_format).to_string();
        put_str(&mut header, col, &truncate_to_width(&text, unit), style);
    }
    lines.push(cells_to_line(header));

    if bars.is_empty() {
        lines.push(Line::from(Span::styled(
            " No tasks with both a start and a due date",
            Style::default().fg(app.theme.dim).bg(bg),
        )));
        frame.render_widget(Paragraph::new(lines), inner);
        return;
    }

    let rows = inner.height as usize - 1;
    let cursor = app.timeline_cursor.min(bars.len() - 1);
    app.timeline_cursor = cursor;
    let scroll = scroll_to_cursor(0, cursor, rows);
    let focused = app.focus == Focus::Timeline;
    let active = app.workspace.active_id();

    for (i, bar) in bars.iter().enumerate().skip(scroll).take(rows) {
        let selected = focused && i == cursor;
        let mut cells: Vec<Cell> = vec![(' ', Style::default().bg(bg)); width];

        if let Some(col) = today_col
            && col < width
        {
            cells[col] = ('\u{250A}', Style::default().fg(app.theme.highlight).bg(bg));
        }

        let mut label_style = Style::default().fg(app.theme.text).bg(bg);
        if selected {
            label_style = label_style.bg(app.theme.selection_bg);
        }
        if active == Some(&bar.id) {
            label_style = label_style
                .fg(app.theme.text_bright)
                .add_modifier(Modifier::BOLD);
        }
        let title = truncate_to_width(&format!(" {}", bar.title), label_width.saturating_sub(1));
        let padded = format!(
            "{}{}",
            title,
            " ".repeat(label_width.saturating_sub(1 + display_width(&title)))
        );
        put_str(&mut cells, 0, &padded, label_style);

        // Bars shorter than a cell still get one
        let bar_width = bar.width.max(1);
        let filled = bar_width * i64::from(bar.progress) / 100;
        let color = app.theme.status_color(bar.status);
        for k in 0..bar_width {
            let col = bar.offset + k;
            if col < label_width as i64 || col >= width as i64 {
                continue;
            }
            let glyph = if k < filled { '\u{2588}' } else { '\u{2591}' };
            cells[col as usize] = (glyph, Style::default().fg(color).bg(bg));
        }
        lines.push(cells_to_line(cells));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Write `text` into `cells` starting at `col`, clipped to the row
fn put_str(cells: &mut [Cell], col: usize, text: &str, style: Style) {
    for (i, c) in text.chars().enumerate() {
        if let Some(cell) = cells.get_mut(col + i) {
            *cell = (c, style);
        }
    }
}

/// Merge runs of equally styled cells into spans
fn cells_to_line(cells: Vec<Cell>) -> Line<'static> {
    let mut spans: Vec<Span> = Vec::new();
    let mut run = String::new();
    let mut run_style: Option<Style> = None;
    for (c, style) in cells {
        if run_style.is_some_and(|s| s != style) {
            spans.push(Span::styled(std::mem::take(&mut run), run_style.unwrap_or_default()));
        }
        run_style = Some(style);
        run.push(c);
    }
    if let Some(style) = run_style {
        spans.push(Span::styled(run, style));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::TimelineConfig;
    use crate::tui::render::test_helpers::*;

    fn narrow(app: &mut App) {
        app.config.timeline = TimelineConfig {
            days: 10,
            columns_per_day: 3,
            label_width: 14,
        };
    }

    #[test]
    fn bars_are_placed_on_the_axis() {
        let mut app = app_with_tasks(sample_tasks());
        narrow(&mut app);
        let output = render_to_string(50, 8, |frame, area| render_timeline(frame, &mut app, area));
        let lines: Vec<&str> = output.lines().collect();
        // Axis starts five days before 2025-03-10
        assert!(lines[1].starts_with("\u{2502} Task         05 06 07 08 09 10 11"));
        // Login page: 03-08 to 03-14, half done: 6 days of 3 columns
        let login = lines[2];
        assert!(login.starts_with("\u{2502} Login page"));
        let bar: String = login.chars().skip(1 + 14 + 9).take(18).collect();
        assert_eq!(bar, "\u{2588}".repeat(9) + &"\u{2591}".repeat(9));
        // "Write docs" has no dates and gets no row
        assert!(lines[3].starts_with("\u{2502} Task API"));
        assert!(lines[4].starts_with("\u{2502} Project set"));
    }

    #[test]
    fn no_dated_tasks() {
        let mut app = app_with_tasks(Vec::new());
        let output = render_to_string(50, 6, |frame, area| render_timeline(frame, &mut app, area));
        assert!(output.contains("No tasks with both a start and a due date"));
    }

    #[test]
    fn cursor_is_clamped() {
        let mut app = app_with_tasks(sample_tasks());
        narrow(&mut app);
        app.timeline_cursor = 99;
        let _ = render_to_string(50, 8, |frame, area| render_timeline(frame, &mut app, area));
        assert_eq!(app.timeline_cursor, 2);
    }

    #[test]
    fn merging_cells() {
        let a = Style::default();
        let b = Style::default().add_modifier(Modifier::BOLD);
        let line = cells_to_line(vec![('a', a), ('b', a), ('c', b)]);
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].content, "ab");
    }
}
