use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::ops::form::DraftField;
use crate::tui::app::{App, LoginField};
use crate::tui::editor::TextInput;
use crate::util::unicode::{display_width, truncate_to_width};

use super::help_overlay::centered_rect;

/// Width of the field name column in both forms
const FORM_LABEL_WIDTH: usize = 20;

/// Render the sign-in (or create-account) screen
pub fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let screen = &app.login;
    let fields = screen.fields();
    // Title, blank, one row per field, blank, hints
    let height = (fields.len() as u16 + 6).min(area.height);
    let width = 64.min(area.width);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, popup);

    let title = if screen.register {
        " Create account "
    } else {
        " Sign in "
    };
    let block = Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let value_width = (inner.width as usize).saturating_sub(FORM_LABEL_WIDTH + 1);
    let mut lines: Vec<Line> = vec![Line::from("")];
    for (i, field) in fields.iter().enumerate() {
        let focused = i == screen.field;
        let input = screen.input(*field);
        let shown = if *field == LoginField::Password {
            "\u{2022}".repeat(input.text().chars().count())
        } else {
            input.text().to_string()
        };
        lines.push(field_line(app, field.label(), shown, value_width, focused));
        if focused {
            place_cursor(frame, inner, 1 + i as u16, input, field == &LoginField::Password);
        }
    }
    lines.push(Line::from(""));
    let hint = if screen.register {
        " Enter create  Tab next field  Ctrl+R sign in instead"
    } else {
        " Enter sign in  Tab next field  Ctrl+R create account"
    };
    lines.push(Line::from(Span::styled(
        truncate_to_width(hint, inner.width as usize),
        Style::default().fg(app.theme.dim).bg(bg),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render the new-task popup over the panels
pub fn render_new_task(frame: &mut Frame, app: &App, area: Rect) {
    let Some(form) = &app.new_task else {
        return;
    };
    let bg = app.theme.background;
    let popup = centered_rect(70, 60, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(Span::styled(
            " New task ",
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let value_width = (inner.width as usize).saturating_sub(FORM_LABEL_WIDTH + 1);
    let current = form.current_field();
    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in DraftField::ALL.iter().enumerate() {
        let focused = *field == current;
        let value = if focused && !field.is_choice() {
            form.input.text().to_string()
        } else if field.is_choice() {
            format!("\u{25C2} {} \u{25B8}", form.draft.field_text(*field))
        } else {
            form.draft.field_text(*field)
        };
        lines.push(field_line(app, field.label(), value, value_width, focused));
        if focused && !field.is_choice() {
            place_cursor(frame, inner, i as u16, &form.input, false);
        }
    }

    lines.push(Line::from(""));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            Style::default().fg(app.theme.red).bg(bg),
        )));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn field_line(
    app: &App,
    label: &str,
    value: String,
    value_width: usize,
    focused: bool,
) -> Line<'static> {
    let bg = app.theme.background;
    let label_style = if focused {
        Style::default()
            .fg(app.theme.highlight)
            .bg(bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.dim).bg(bg)
    };
    let marker = if focused { "\u{25B8}" } else { " " };
    let label_text = format!("{}{:<w$}", marker, label, w = FORM_LABEL_WIDTH);
    // Long values show their tail so the cursor end stays visible
    let value = if display_width(&value) > value_width {
        let skip = value.chars().count().saturating_sub(value_width);
        value.chars().skip(skip).collect()
    } else {
        value
    };
    Line::from(vec![
        Span::styled(label_text, label_style),
        Span::styled(value, Style::default().fg(app.theme.text_bright).bg(bg)),
    ])
}

fn place_cursor(frame: &mut Frame, inner: Rect, row: u16, input: &TextInput, masked: bool) {
    let col = if masked {
        input.text()[..input.cursor()].chars().count()
    } else {
        display_width(&input.text()[..input.cursor()])
    };
    let value_width = (inner.width as usize).saturating_sub(FORM_LABEL_WIDTH + 1);
    let x = inner.x as usize + 1 + FORM_LABEL_WIDTH + col.min(value_width);
    if row < inner.height && x < (inner.x + inner.width) as usize {
        frame.set_cursor_position(Position::new(x as u16, inner.y + row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::{Mode, NewTaskForm};
    use crate::ops::form::TaskDraft;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn login_masks_password() {
        let mut app = signed_out_app();
        app.login.email = TextInput::single_line("ada@example.com");
        app.login.password = TextInput::single_line("secret");
        let output = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_login(frame, &app, area)
        });
        assert!(output.contains("Sign in"));
        assert!(output.contains("Email               ada@example.com"));
        assert!(output.contains("Password            \u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}"));
        assert!(!output.contains("secret"));
        assert!(output.contains("OAuth redirect URL"));
    }

    #[test]
    fn register_screen() {
        let mut app = signed_out_app();
        app.login.register = true;
        let output = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_login(frame, &app, area)
        });
        assert!(output.contains("Create account"));
        assert!(output.contains("Name"));
        assert!(!output.contains("OAuth"));
    }

    #[test]
    fn new_task_popup() {
        let mut app = app_with_tasks(sample_tasks());
        app.mode = Mode::NewTask;
        app.new_task = Some(NewTaskForm {
            draft: TaskDraft::new(""),
            field: 0,
            input: TextInput::single_line("Fix bug"),
            error: Some("title is required".into()),
        });
        let output = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_new_task(frame, &app, area)
        });
        assert!(output.contains("New task"));
        assert!(output.contains("\u{25B8}Title"));
        assert!(output.contains("Fix bug"));
        assert!(output.contains("\u{25C2} medium \u{25B8}"));
        assert!(output.contains("title is required"));
    }
}
