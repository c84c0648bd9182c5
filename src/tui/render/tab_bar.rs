use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::App;
use crate::util::unicode::{display_width, truncate_to_width};

/// Widest a single tab title may get before truncation
const MAX_TAB_TITLE: usize = 24;

/// Render the open-task tabs with a separator line below
pub fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Length(1), // separator
        ])
        .split(area);

    let sep_cols = render_tabs(frame, app, chunks[0]);
    render_separator(frame, app, chunks[1], &sep_cols);
}

/// Render tabs and return the column positions of each separator character.
fn render_tabs(frame: &mut Frame, app: &App, area: Rect) -> Vec<usize> {
    let bg = app.theme.background;
    let mut spans: Vec<Span> = Vec::new();
    let mut sep_cols: Vec<usize> = Vec::new();
    let sep = Span::styled("\u{2502}", Style::default().fg(app.theme.dim).bg(bg));

    let tabs = app.workspace.open_tasks();
    if tabs.is_empty() {
        spans.push(Span::styled(
            " No open tasks",
            Style::default().fg(app.theme.dim).bg(bg),
        ));
    }

    let active = app.workspace.active_id();
    let width = area.width as usize;
    for task in tabs {
        let is_current = active == Some(&task.id);
        let title = truncate_to_width(&task.title, MAX_TAB_TITLE);
        let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
        if used + display_width(&title) + 3 > width {
            spans.push(Span::styled(
                "\u{2026}",
                Style::default().fg(app.theme.dim).bg(bg),
            ));
            break;
        }
        let marker_bg = if is_current {
            app.theme.selection_bg
        } else {
            bg
        };
        spans.push(Span::styled(" ", Style::default().bg(marker_bg)));
        spans.push(Span::styled(title, tab_style(app, is_current)));
        spans.push(Span::styled(" ", Style::default().bg(marker_bg)));
        sep_cols.push(spans.iter().map(|s| display_width(&s.content)).sum());
        spans.push(sep.clone());
    }

    let line = Line::from(spans);
    let tabs = Paragraph::new(line).style(Style::default().bg(bg));
    frame.render_widget(tabs, area);
    sep_cols
}

/// Horizontal rule under the tabs, with ┴ joints under each separator
fn render_separator(frame: &mut Frame, app: &App, area: Rect, sep_cols: &[usize]) {
    let width = area.width as usize;
    let rule: String = (0..width)
        .map(|i| {
            if sep_cols.contains(&i) {
                '\u{2534}'
            } else {
                '\u{2500}'
            }
        })
        .collect();
    let line = Line::from(Span::styled(
        rule,
        Style::default().fg(app.theme.dim).bg(app.theme.background),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn tab_style(app: &App, is_current: bool) -> Style {
    if is_current {
        Style::default()
            .fg(app.theme.text_bright)
            .bg(app.theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text).bg(app.theme.background)
    }
}
