//! Grapheme-aware text buffer with a cursor, shared by every input field.

use crate::util::unicode;

/// An editable buffer. Single-line inputs reject newlines; multi-line inputs
/// (the description editor) keep them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    buffer: String,
    /// Byte offset into `buffer`, always on a grapheme boundary
    cursor: usize,
    multiline: bool,
    /// Preferred display column for vertical movement
    sticky_col: Option<usize>,
}

impl TextInput {
    pub fn single_line(text: &str) -> Self {
        let text = text.replace(['\n', '\r'], " ");
        TextInput {
            cursor: text.len(),
            buffer: text,
            multiline: false,
            sticky_col: None,
        }
    }

    pub fn multi_line(text: &str) -> Self {
        TextInput {
            buffer: text.to_string(),
            cursor: text.len(),
            multiline: true,
            sticky_col: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn set_text(&mut self, text: &str) {
        *self = if self.multiline {
            TextInput::multi_line(text)
        } else {
            TextInput::single_line(text)
        };
    }

    pub fn clear(&mut self) {
        self.set_text("");
    }

    pub fn insert_char(&mut self, c: char) {
        if c == '\n' && !self.multiline {
            return;
        }
        self.buffer.insert(self.cursor, c);
        self.cursor += c.len_utf8();
        self.sticky_col = None;
    }

    /// Insert pasted text. Single-line inputs flatten newlines to spaces.
    pub fn insert_str(&mut self, text: &str) {
        let text = if self.multiline {
            text.replace('\r', "")
        } else {
            text.replace('\r', "").replace('\n', " ")
        };
        self.buffer.insert_str(self.cursor, &text);
        self.cursor += text.len();
        self.sticky_col = None;
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.buffer, self.cursor) {
            self.buffer.drain(prev..self.cursor);
            self.cursor = prev;
        }
        self.sticky_col = None;
    }

    pub fn delete(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.buffer, self.cursor) {
            self.buffer.drain(self.cursor..next);
        }
        self.sticky_col = None;
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.buffer, self.cursor) {
            self.cursor = prev;
        }
        self.sticky_col = None;
    }

    pub fn move_right(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.buffer, self.cursor) {
            self.cursor = next;
        }
        self.sticky_col = None;
    }

    pub fn word_left(&mut self) {
        self.cursor = unicode::word_boundary_left(&self.buffer, self.cursor);
        self.sticky_col = None;
    }

    pub fn word_right(&mut self) {
        self.cursor = unicode::word_boundary_right(&self.buffer, self.cursor);
        self.sticky_col = None;
    }

    fn line_start(&self) -> usize {
        self.buffer[..self.cursor].rfind('\n').map_or(0, |i| i + 1)
    }

    fn line_end(&self) -> usize {
        self.buffer[self.cursor..]
            .find('\n')
            .map_or(self.buffer.len(), |i| self.cursor + i)
    }

    pub fn home(&mut self) {
        self.cursor = self.line_start();
        self.sticky_col = None;
    }

    pub fn end(&mut self) {
        self.cursor = self.line_end();
        self.sticky_col = None;
    }

    /// Delete from the start of the line to the cursor
    pub fn kill_to_line_start(&mut self) {
        let start = self.line_start();
        self.buffer.drain(start..self.cursor);
        self.cursor = start;
        self.sticky_col = None;
    }

    /// (line, display column) of the cursor
    pub fn cursor_position(&self) -> (usize, usize) {
        let before = &self.buffer[..self.cursor];
        let line = before.matches('\n').count();
        let col = unicode::display_width(&before[self.line_start()..]);
        (line, col)
    }

    pub fn move_up(&mut self) {
        self.move_vertical(-1);
    }

    pub fn move_down(&mut self) {
        self.move_vertical(1);
    }

    fn move_vertical(&mut self, delta: isize) {
        if !self.multiline {
            return;
        }
        let (line, col) = self.cursor_position();
        let target_col = *self.sticky_col.get_or_insert(col);
        let Some(target_line) = line.checked_add_signed(delta) else {
            return;
        };
        let mut offset = 0;
        for (i, text) in self.buffer.split('\n').enumerate() {
            if i == target_line {
                self.cursor = offset + unicode::display_col_to_byte_offset(text, target_col);
                return;
            }
            offset += text.len() + 1;
        }
    }

    pub fn lines(&self) -> Vec<&str> {
        self.buffer.split('\n').collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_and_backspace() {
        let mut input = TextInput::single_line("");
        for c in "héllo".chars() {
            input.insert_char(c);
        }
        assert_eq!(input.text(), "héllo");
        input.move_left();
        input.move_left();
        input.move_left();
        input.backspace();
        assert_eq!(input.text(), "hllo");
        input.delete();
        assert_eq!(input.text(), "hlo");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn single_line_rejects_newlines() {
        let mut input = TextInput::single_line("a\nb");
        assert_eq!(input.text(), "a b");
        input.insert_char('\n');
        input.insert_str("c\r\nd");
        assert_eq!(input.text(), "a bc d");
        input.move_up();
        assert_eq!(input.cursor(), input.text().len());
    }

    #[test]
    fn multiline_vertical_movement_keeps_column() {
        let mut input = TextInput::multi_line("long line here\nab\nanother line");
        assert_eq!(input.cursor_position(), (2, 12));
        input.move_up();
        assert_eq!(input.cursor_position(), (1, 2));
        input.move_up();
        assert_eq!(input.cursor_position(), (0, 12));
        input.move_up();
        assert_eq!(input.cursor_position(), (0, 12));
        input.move_down();
        input.move_down();
        assert_eq!(input.cursor_position(), (2, 12));
    }

    #[test]
    fn home_end_and_kill() {
        let mut input = TextInput::multi_line("first\nsecond line");
        input.home();
        assert_eq!(input.cursor_position(), (1, 0));
        input.end();
        input.word_left();
        assert_eq!(input.cursor_position(), (1, 7));
        input.kill_to_line_start();
        assert_eq!(input.text(), "first\nline");
        input.insert_char('\n');
        assert_eq!(input.lines(), vec!["first", "", "line"]);
    }

    #[test]
    fn wide_characters_measure_by_cell() {
        let mut input = TextInput::multi_line("日本語\nabcdef");
        input.move_up();
        // col 6 on the wide line lands at the end
        assert_eq!(input.cursor_position(), (0, 6));
        input.move_left();
        assert_eq!(input.cursor_position(), (0, 4));
    }
}
