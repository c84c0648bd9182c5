pub mod content;
pub mod explorer;
pub mod form;
pub mod help_overlay;
pub mod properties;
pub mod status_row;
pub mod tab_bar;
pub mod timeline;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders};
use regex::Regex;

use crate::ops::layout::Panel;
use super::app::{App, Focus, Mode, PanelRects};

/// Main render function. Records panel areas on the app for mouse hit-testing.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: body | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    if !app.is_signed_in() {
        app.rects = PanelRects::default();
        form::render_login(frame, app, chunks[0]);
        status_row::render_status_row(frame, app, chunks[1]);
        return;
    }

    app.rects = split_panels(app, chunks[0]);
    let rects = app.rects;

    if let Some(r) = rects.explorer {
        explorer::render_explorer(frame, app, r);
    }
    content::render_content(frame, app, rects.content);
    if let Some(r) = rects.properties {
        properties::render_properties(frame, app, r);
    }
    if let Some(r) = rects.timeline {
        timeline::render_timeline(frame, app, r);
    }

    if app.mode == Mode::NewTask {
        form::render_new_task(frame, app, chunks[0]);
    }

    // Help overlay (rendered on top of everything)
    if app.show_help {
        help_overlay::render_help_overlay(frame, app, chunks[0]);
    }

    status_row::render_status_row(frame, app, chunks[1]);
}

/// Divide the body into the visible panels
fn split_panels(app: &App, body: Rect) -> PanelRects {
    let layout = &app.layout;
    let (top, timeline) = if layout.is_visible(Panel::Timeline) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Percentage(layout.size(Panel::Timeline)),
            ])
            .split(body);
        (rows[0], Some(rows[1]))
    } else {
        (body, None)
    };

    let mut constraints = Vec::with_capacity(3);
    if layout.is_visible(Panel::Explorer) {
        constraints.push(Constraint::Percentage(layout.size(Panel::Explorer)));
    }
    constraints.push(Constraint::Min(10));
    if layout.is_visible(Panel::Properties) {
        constraints.push(Constraint::Percentage(layout.size(Panel::Properties)));
    }
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(top);

    let mut cols = cols.iter().copied();
    let explorer = layout
        .is_visible(Panel::Explorer)
        .then(|| cols.next())
        .flatten();
    let content = cols.next().unwrap_or(top);
    let properties = cols.next();

    PanelRects {
        body,
        explorer,
        content,
        properties,
        timeline,
    }
}

/// Bordered block for a panel, highlighted when focused
pub(super) fn panel_block<'a>(app: &App, title: &'a str, focus: Focus) -> Block<'a> {
    let focused = app.focus == focus;
    let border = if focused {
        app.theme.highlight
    } else {
        app.theme.dim
    };
    let title_style = if focused {
        Style::default()
            .fg(app.theme.text_bright)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border).bg(app.theme.background))
        .title(Span::styled(format!(" {} ", title), title_style))
        .style(Style::default().bg(app.theme.background))
}

/// Push spans for text with regex match highlighting. If no regex or no matches,
/// pushes a single span with `base_style`. Otherwise splits text at match boundaries.
pub(super) fn push_highlighted_spans<'a>(
    spans: &mut Vec<Span<'a>>,
    text: &str,
    base_style: Style,
    highlight_style: Style,
    search_re: Option<&Regex>,
) {
    let re = match search_re {
        Some(r) => r,
        None => {
            spans.push(Span::styled(text.to_string(), base_style));
            return;
        }
    };

    let mut last_end = 0;
    let mut has_match = false;
    for m in re.find_iter(text) {
        if m.start() == m.end() {
            continue;
        }
        has_match = true;
        if m.start() > last_end {
            spans.push(Span::styled(
                text[last_end..m.start()].to_string(),
                base_style,
            ));
        }
        spans.push(Span::styled(
            text[m.start()..m.end()].to_string(),
            highlight_style,
        ));
        last_end = m.end();
    }
    if !has_match {
        spans.push(Span::styled(text.to_string(), base_style));
    } else if last_end < text.len() {
        spans.push(Span::styled(text[last_end..].to_string(), base_style));
    }
}

/// Keep `cursor` inside a window of `height` rows starting at `offset`
pub(super) fn scroll_to_cursor(offset: usize, cursor: usize, height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    if cursor < offset {
        cursor
    } else if cursor >= offset + height {
        cursor + 1 - height
    } else {
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn full_screen_shows_every_panel() {
        let mut app = app_with_tasks(sample_tasks());
        let output = render_app(&mut app);
        assert!(output.contains(" Explorer "));
        assert!(output.contains(" Properties "));
        assert!(output.contains(" Timeline "));
        assert!(app.rects.explorer.is_some());
        assert!(app.rects.timeline.is_some());
    }

    #[test]
    fn hidden_panels_give_space_to_content() {
        let mut app = app_with_tasks(sample_tasks());
        app.layout.toggle(Panel::Explorer);
        app.layout.toggle(Panel::Properties);
        app.layout.toggle(Panel::Timeline);
        let output = render_app(&mut app);
        assert!(!output.contains(" Explorer "));
        assert_eq!(app.rects.content.width, TERM_W);
        assert_eq!(app.rects.content.height, TERM_H - 1);
        assert_eq!(app.rects.timeline, None);
    }

    #[test]
    fn signed_out_shows_login() {
        let mut app = signed_out_app();
        let output = render_app(&mut app);
        assert!(output.contains("Sign in"));
        assert!(!output.contains(" Explorer "));
    }

    #[test]
    fn scroll_window_follows_cursor() {
        assert_eq!(scroll_to_cursor(0, 3, 5), 0);
        assert_eq!(scroll_to_cursor(0, 7, 5), 3);
        assert_eq!(scroll_to_cursor(4, 2, 5), 2);
        assert_eq!(scroll_to_cursor(4, 2, 0), 0);
    }
}
