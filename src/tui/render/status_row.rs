use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, BannerKind, Mode};
use crate::util::unicode::display_width;

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let (mut spans, hint) = if let Some(label) = app.loading {
        (
            vec![Span::styled(
                format!("\u{27F3} {}\u{2026}", label),
                Style::default().fg(app.theme.highlight).bg(bg),
            )],
            "",
        )
    } else if !app.is_signed_in() {
        (banner_spans(app), "")
    } else {
        match app.mode {
            Mode::Search => (
                vec![
                    Span::styled(
                        format!("/{}", app.search_input.text()),
                        Style::default().fg(app.theme.text_bright).bg(bg),
                    ),
                    Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)),
                ],
                "Enter keep  Esc cancel",
            ),
            Mode::ConfirmDelete => {
                let title = app
                    .workspace
                    .active_task()
                    .map_or(String::new(), |t| t.title.clone());
                (
                    vec![Span::styled(
                        format!("Delete \"{}\"? (y/n)", title),
                        Style::default()
                            .fg(app.theme.red)
                            .bg(bg)
                            .add_modifier(Modifier::BOLD),
                    )],
                    "",
                )
            }
            Mode::EditDescription => (banner_spans(app), "Esc save"),
            Mode::EditProperty(_) => (banner_spans(app), "Enter save  Esc cancel"),
            Mode::EditCriterion(_) => (banner_spans(app), "Tab next  Enter save  Esc cancel"),
            Mode::NewTask => (banner_spans(app), "Tab next  Enter create  Esc cancel"),
            Mode::Navigate => {
                let mut spans = banner_spans(app);
                if spans.is_empty() && !app.explorer.query.is_empty() {
                    spans.push(Span::styled(
                        format!("/{}", app.explorer.query),
                        Style::default().fg(app.theme.dim).bg(bg),
                    ));
                }
                (spans, "? help")
            }
        }
    };

    // Right-aligned hint, then the signed-in user
    let user = app
        .session
        .user
        .as_ref()
        .map(|u| format!(" {} ", u.display_name()))
        .unwrap_or_default();
    let right = match (hint.is_empty(), user.is_empty()) {
        (true, _) => user,
        (false, true) => hint.to_string(),
        (false, false) => format!("{} \u{2502}{}", hint, user),
    };
    let content_width: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    let right_width = display_width(&right);
    if !right.is_empty() && content_width + right_width < width {
        let padding = width - content_width - right_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(right, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

fn banner_spans(app: &App) -> Vec<Span<'static>> {
    let Some(banner) = &app.banner else {
        return Vec::new();
    };
    let color = match banner.kind {
        BannerKind::Info => app.theme.green,
        BannerKind::Error => app.theme.red,
    };
    vec![Span::styled(
        banner.text.clone(),
        Style::default().fg(color).bg(app.theme.background),
    )]
}
