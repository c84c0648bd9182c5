use std::collections::HashMap;

use ratatui::style::Color;

use crate::io::state::ThemeMode;
use crate::model::UiConfig;
use crate::model::task::{Priority, TaskStatus};

/// Labels drawn in the accent color unless overridden by `[ui.label_colors]`
const ACCENT_LABELS: [&str; 8] = [
    "frontend", "backend", "database", "security", "feature", "bug", "ui", "mobile",
];

/// Parsed color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub mode: ThemeMode,
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    /// Primary accent: focus borders, the today marker, the cursor
    pub highlight: Color,
    /// Secondary accent: timeline progress, accent labels
    pub accent: Color,
    pub dim: Color,
    pub red: Color,
    pub yellow: Color,
    pub green: Color,
    pub cyan: Color,
    pub purple: Color,
    pub blue: Color,
    pub selection_bg: Color,
    pub search_match_bg: Color,
    pub search_match_fg: Color,
    /// Per-label colors
    pub label_colors: HashMap<String, Color>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Theme {
            mode: ThemeMode::Dark,
            background: Color::Rgb(0x0C, 0x00, 0x1B),
            text: Color::Rgb(0xB0, 0xAA, 0xFF),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFF, 0x3A, 0x4C),
            accent: Color::Rgb(0xFF, 0x70, 0x80),
            dim: Color::Rgb(0x7D, 0x78, 0xBF),
            red: Color::Rgb(0xFF, 0x44, 0x44),
            yellow: Color::Rgb(0xFF, 0xD7, 0x00),
            green: Color::Rgb(0x44, 0xFF, 0x88),
            cyan: Color::Rgb(0x44, 0xDD, 0xFF),
            purple: Color::Rgb(0xCC, 0x66, 0xFF),
            blue: Color::Rgb(0x44, 0x88, 0xFF),
            selection_bg: Color::Rgb(0x3D, 0x14, 0x38),
            search_match_bg: Color::Rgb(0x40, 0xE0, 0xD0),
            search_match_fg: Color::Rgb(0x0C, 0x00, 0x1B),
            label_colors: HashMap::new(),
        }
    }

    pub fn light() -> Self {
        Theme {
            mode: ThemeMode::Light,
            background: Color::Rgb(0xF4, 0xF4, 0xF8),
            text: Color::Rgb(0x2A, 0x2A, 0x40),
            text_bright: Color::Rgb(0x00, 0x00, 0x00),
            highlight: Color::Rgb(0x36, 0xFF, 0x74),
            accent: Color::Rgb(0x6A, 0xFF, 0xB0),
            dim: Color::Rgb(0x80, 0x80, 0x98),
            red: Color::Rgb(0xD0, 0x20, 0x20),
            yellow: Color::Rgb(0xB0, 0x80, 0x00),
            green: Color::Rgb(0x10, 0x90, 0x40),
            cyan: Color::Rgb(0x00, 0x80, 0xA0),
            purple: Color::Rgb(0x80, 0x30, 0xC0),
            blue: Color::Rgb(0x20, 0x50, 0xD0),
            selection_bg: Color::Rgb(0xD8, 0xF5, 0xE0),
            search_match_bg: Color::Rgb(0x40, 0xE0, 0xD0),
            search_match_fg: Color::Rgb(0x00, 0x00, 0x00),
            label_colors: HashMap::new(),
        }
    }

    /// Build the palette for `mode`, then apply `[ui.colors]` and
    /// `[ui.label_colors]` overrides
    pub fn from_config(ui: &UiConfig, mode: ThemeMode) -> Self {
        let mut theme = match mode {
            ThemeMode::Dark => Theme::dark(),
            ThemeMode::Light => Theme::light(),
        };

        for (key, value) in &ui.colors {
            if let Some(color) = parse_hex_color(value) {
                match key.as_str() {
                    "background" => theme.background = color,
                    "text" => theme.text = color,
                    "text_bright" => theme.text_bright = color,
                    "highlight" => theme.highlight = color,
                    "accent" => theme.accent = color,
                    "dim" => theme.dim = color,
                    "red" => theme.red = color,
                    "yellow" => theme.yellow = color,
                    "green" => theme.green = color,
                    "cyan" => theme.cyan = color,
                    "purple" => theme.purple = color,
                    "blue" => theme.blue = color,
                    "selection_bg" => theme.selection_bg = color,
                    "search_match_bg" => theme.search_match_bg = color,
                    "search_match_fg" => theme.search_match_fg = color,
                    _ => {}
                }
            }
        }

        for (label, value) in &ui.label_colors {
            if let Some(color) = parse_hex_color(value) {
                theme.label_colors.insert(label.to_lowercase(), color);
            }
        }

        theme
    }

    pub fn label_color(&self, label: &str) -> Color {
        let key = label.to_lowercase();
        if let Some(color) = self.label_colors.get(&key) {
            return *color;
        }
        if ACCENT_LABELS.contains(&key.as_str()) {
            self.accent
        } else {
            self.dim
        }
    }

    pub fn status_color(&self, status: TaskStatus) -> Color {
        match status {
            TaskStatus::Todo => self.text,
            TaskStatus::InProgress => self.highlight,
            TaskStatus::Review => self.purple,
            TaskStatus::Done => self.green,
        }
    }

    pub fn priority_color(&self, priority: Priority) -> Color {
        match priority {
            Priority::Low => self.green,
            Priority::Medium => self.yellow,
            Priority::High => self.red,
            Priority::Critical => self.highlight,
        }
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}
