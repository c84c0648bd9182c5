use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::ops::layout::{Panel, ResizeDrag};
use crate::tui::app::{App, Focus, Mode};

use super::navigate::activate_explorer_row;

fn contains(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

/// The panel whose draggable border is at (col, row)
fn border_at(app: &App, col: u16, row: u16) -> Option<(Panel, u16)> {
    let rects = &app.rects;
    if let Some(r) = rects.explorer
        && r.width > 0
        && col == r.x + r.width - 1
        && row >= r.y
        && row < r.y + r.height
    {
        return Some((Panel::Explorer, col));
    }
    if let Some(r) = rects.properties
        && col == r.x
        && row >= r.y
        && row < r.y + r.height
    {
        return Some((Panel::Properties, col));
    }
    if let Some(r) = rects.timeline
        && row == r.y
        && col >= r.x
        && col < r.x + r.width
    {
        return Some((Panel::Timeline, row));
    }
    None
}

fn focus_at(app: &App, col: u16, row: u16) -> Option<(Focus, Rect)> {
    let rects = &app.rects;
    [
        (Focus::Explorer, rects.explorer),
        (Focus::Properties, rects.properties),
        (Focus::Timeline, rects.timeline),
        (Focus::Content, Some(rects.content)),
    ]
    .into_iter()
    .find_map(|(focus, rect)| rect.filter(|r| contains(*r, col, row)).map(|r| (focus, r)))
}

pub(super) fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (col, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some((panel, origin)) = border_at(app, col, row) {
                app.drag = Some(ResizeDrag::begin(&app.layout, panel, origin));
                return;
            }
            let Some((focus, rect)) = focus_at(app, col, row) else {
                return;
            };
            app.focus = focus;
            if focus == Focus::Explorer {
                click_explorer(app, rect, row);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let Some(drag) = app.drag else {
                return;
            };
            let body = app.rects.body;
            let (pos, extent) = match drag.panel() {
                Panel::Timeline => (row, body.height),
                Panel::Explorer | Panel::Properties => (col, body.width),
            };
            drag.update(&mut app.layout, pos, extent);
        }
        MouseEventKind::Up(MouseButton::Left) => app.drag = None,
        MouseEventKind::ScrollDown => scroll(app, col, row, 1),
        MouseEventKind::ScrollUp => scroll(app, col, row, -1),
        _ => {}
    }
}

fn click_explorer(app: &mut App, rect: Rect, row: u16) {
    // Skip the top border
    let Some(line) = row.checked_sub(rect.y + 1) else {
        return;
    };
    let index = app.explorer.scroll_offset + line as usize;
    if index < app.explorer_rows().len() {
        app.explorer.cursor = index;
        activate_explorer_row(app);
    }
}

fn scroll(app: &mut App, col: u16, row: u16, delta: isize) {
    if app.mode != Mode::Navigate {
        return;
    }
    match focus_at(app, col, row).map(|(f, _)| f) {
        Some(Focus::Explorer) => {
            let rows = app.explorer_rows().len();
            app.explorer.cursor = app.explorer.cursor.saturating_add_signed(delta);
            app.explorer.clamp_cursor(rows);
        }
        Some(Focus::Content) => {
            app.content_scroll = app.content_scroll.saturating_add_signed(delta);
        }
        _ => {}
    }
}
