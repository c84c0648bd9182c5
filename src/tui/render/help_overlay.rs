use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::{App, Focus};

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Center the overlay, leaving some margin
    let overlay_area = centered_rect(60, 90, area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(" Key Bindings", header_style)));
    lines.push(Line::from(""));

    // Context-sensitive help for the focused panel
    let (title, bindings): (&str, &[(&str, &str)]) = match app.focus {
        Focus::Explorer => (
            " Explorer",
            &[
                (" \u{2191}\u{2193}/jk", "Move cursor"),
                (" g/G", "Jump to top/bottom"),
                (" Space/l", "Open task or toggle group"),
                (" Enter", "Open task and focus it"),
                (" h", "Collapse group"),
                (" /", "Filter tasks"),
            ],
        ),
        Focus::Content => (
            " Content",
            &[
                (" \u{2191}\u{2193}/jk", "Scroll"),
                (" i/Enter", "Edit description"),
                (" c", "Edit acceptance criteria"),
                (" [ ]", "Previous/next tab"),
                (" x", "Close tab"),
            ],
        ),
        Focus::Properties => (
            " Properties",
            &[
                (" \u{2191}\u{2193}/jk", "Move cursor"),
                (" h/l", "Cycle a choice"),
                (" Enter", "Edit field"),
            ],
        ),
        Focus::Timeline => (
            " Timeline",
            &[
                (" \u{2191}\u{2193}/jk", "Move cursor"),
                (" Enter", "Open task"),
            ],
        ),
    };
    lines.push(Line::from(Span::styled(title, header_style)));
    for (key, desc) in bindings {
        add_binding(&mut lines, key, desc, key_style, desc_style);
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(" Global", header_style)));
    add_binding(&mut lines, " Tab", "Next panel", key_style, desc_style);
    add_binding(&mut lines, " E/P/T", "Toggle explorer/properties/timeline", key_style, desc_style);
    add_binding(&mut lines, " < >", "Resize focused panel", key_style, desc_style);
    add_binding(&mut lines, " n", "New task", key_style, desc_style);
    add_binding(&mut lines, " D", "Delete active task", key_style, desc_style);
    add_binding(&mut lines, " r", "Reload tasks", key_style, desc_style);
    add_binding(&mut lines, " L", "Toggle light/dark", key_style, desc_style);
    add_binding(&mut lines, " O", "Sign out", key_style, desc_style);
    add_binding(&mut lines, " ?", "Toggle this help", key_style, desc_style);
    add_binding(&mut lines, " q", "Quit", key_style, desc_style);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Drag a panel border with the mouse to resize it",
        Style::default().fg(app.theme.dim).bg(bg),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(bg));

    frame.render_widget(paragraph, overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    let key_width = 12;
    let padded_key = format!("{:<width$}", key, width = key_width);
    lines.push(Line::from(vec![
        Span::styled(padded_key, key_style),
        Span::styled(desc, desc_style),
    ]));
}

/// Create a centered rectangle of the given percentage of the parent
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
