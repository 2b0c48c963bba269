//! TUI application state management.

use std::time::{Duration, Instant};

use crate::session::{Notice, SessionState};
use crate::utils::unicode::char_to_byte_index;

/// How long a notification stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(3);

const TAB_WIDTH: usize = 4;

/// Multi-line source editor. The cursor column is a character index.
#[derive(Debug, Clone, PartialEq)]
pub struct Editor {
    pub lines: Vec<String>,
    pub row: usize,
    pub col: usize,
}

impl Editor {
    pub fn new(text: &str) -> Self {
        let mut editor = Self { lines: Vec::new(), row: 0, col: 0 };
        editor.load(text);
        editor
    }

    /// Replace the whole buffer and put the cursor at the end.
    pub fn load(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        self.row = self.lines.len() - 1;
        self.col = self.line_chars(self.row);
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn line_chars(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    fn byte_col(&self) -> usize {
        char_to_byte_index(&self.lines[self.row], self.col)
    }

    pub fn insert_char(&mut self, c: char) {
        if c == '\n' {
            self.newline();
            return;
        }
        let at = self.byte_col();
        self.lines[self.row].insert(at, c);
        self.col += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            match c {
                '\r' => {}
                '\t' => self.insert_tab(),
                c => self.insert_char(c),
            }
        }
    }

    pub fn insert_tab(&mut self) {
        for _ in 0..TAB_WIDTH {
            self.insert_char(' ');
        }
    }

    /// Split the current line at the cursor, carrying its indentation over.
    pub fn newline(&mut self) {
        let at = self.byte_col();
        let rest = self.lines[self.row].split_off(at);
        let indent: String = self.lines[self.row]
            .chars()
            .take_while(|c| *c == ' ')
            .collect();
        self.col = indent.chars().count();
        self.lines.insert(self.row + 1, indent + &rest);
        self.row += 1;
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            let at = self.byte_col();
            self.lines[self.row].remove(at);
        } else if self.row > 0 {
            // Join with the previous line
            let current = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_chars(self.row);
            self.lines[self.row].push_str(&current);
        }
    }

    pub fn delete(&mut self) {
        if self.col < self.line_chars(self.row) {
            let at = self.byte_col();
            self.lines[self.row].remove(at);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_chars(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_chars(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.line_chars(self.row));
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.line_chars(self.row));
        }
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = self.line_chars(self.row);
    }

    /// Text left of the cursor on the current line.
    pub fn before_cursor(&self) -> &str {
        &self.lines[self.row][..self.byte_col()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub notice: Notice,
    pub shown_at: Instant,
}

/// Application state for the TUI
#[derive(Debug)]
pub struct App {
    /// Latest copy of the controller state
    pub session: SessionState,
    pub editor: Editor,
    pub toast: Option<Toast>,
    pub show_help: bool,
    /// Lines scrolled in the output panel
    pub output_scroll: u16,
    /// Service base URL, for the status bar
    pub api_url: String,
}

impl App {
    pub fn new(session: SessionState, api_url: String) -> Self {
        let editor = Editor::new(&session.source);
        Self {
            session,
            editor,
            toast: None,
            show_help: false,
            output_scroll: 0,
            api_url,
        }
    }

    /// Take a fresh controller snapshot. Reloads the editor when the
    /// controller's source diverged from it (language switch).
    pub fn sync(&mut self, session: SessionState) {
        if session.source != self.editor.text() {
            self.editor.load(&session.source);
        }
        if session.last_run != self.session.last_run {
            self.output_scroll = 0;
        }
        self.session = session;
    }

    pub fn notify(&mut self, notice: Notice) {
        self.toast = Some(Toast { notice, shown_at: Instant::now() });
    }

    /// Drop the toast once it has been visible for `TOAST_TTL`.
    pub fn expire_toast(&mut self, now: Instant) {
        if let Some(t) = &self.toast {
            if now.duration_since(t.shown_at) >= TOAST_TTL {
                self.toast = None;
            }
        }
    }

    /// Toggle help display
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn scroll_output_up(&mut self) {
        self.output_scroll = self.output_scroll.saturating_sub(1);
    }

    pub fn scroll_output_down(&mut self) {
        self.output_scroll = self.output_scroll.saturating_add(1);
    }

    pub fn can_run(&self) -> bool {
        !self.session.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    #[test]
    fn test_editor_roundtrips_text() {
        let src = Language::Cpp.template();
        let ed = Editor::new(src);
        assert_eq!(ed.text(), src);
        assert_eq!(ed.row, ed.lines.len() - 1);
        assert_eq!(ed.col, 1);
    }

    #[test]
    fn test_editor_insert_and_newline_keeps_indent() {
        let mut ed = Editor::new("def f():");
        ed.newline();
        ed.insert_tab();
        ed.insert_str("return 1");
        ed.newline();
        ed.insert_str("x");
        assert_eq!(ed.text(), "def f():\n    return 1\n    x");
    }

    #[test]
    fn test_editor_backspace_joins_lines() {
        let mut ed = Editor::new("ab\ncd");
        ed.move_home();
        ed.backspace();
        assert_eq!(ed.text(), "abcd");
        assert_eq!((ed.row, ed.col), (0, 2));
        ed.backspace();
        assert_eq!(ed.text(), "acd");
    }

    #[test]
    fn test_editor_delete_joins_next_line() {
        let mut ed = Editor::new("ab\ncd");
        ed.move_up();
        ed.move_end();
        ed.delete();
        assert_eq!(ed.text(), "abcd");
    }

    #[test]
    fn test_editor_multibyte_cursor() {
        let mut ed = Editor::new("héllo");
        ed.move_home();
        ed.move_right();
        ed.move_right();
        ed.insert_char('X');
        assert_eq!(ed.text(), "héXllo");
        assert_eq!(ed.before_cursor(), "héX");
        ed.backspace();
        ed.backspace();
        assert_eq!(ed.text(), "hllo");
    }

    #[test]
    fn test_editor_vertical_moves_clamp_column() {
        let mut ed = Editor::new("long line\nab");
        ed.move_up();
        ed.move_end();
        ed.move_down();
        assert_eq!((ed.row, ed.col), (1, 2));
        ed.move_down();
        assert_eq!(ed.row, 1);
    }

    #[test]
    fn test_paste_strips_carriage_returns() {
        let mut ed = Editor::new("");
        ed.insert_str("a\r\nb");
        assert_eq!(ed.lines, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_sync_reloads_editor_on_language_switch() {
        let mut app = App::new(SessionState::new(Language::Python), "http://x".into());
        app.editor.insert_str("\n# edit");
        app.sync(SessionState::new(Language::Go));
        assert_eq!(app.editor.text(), Language::Go.template());
    }

    #[test]
    fn test_sync_keeps_cursor_when_source_matches() {
        let mut app = App::new(SessionState::new(Language::Python), "http://x".into());
        app.editor.move_home();
        let mut st = SessionState::new(Language::Python);
        st.in_flight = true;
        app.sync(st);
        assert_eq!(app.editor.col, 0);
        assert!(!app.can_run());
    }

    #[test]
    fn test_toast_expires() {
        let mut app = App::new(SessionState::default(), "http://x".into());
        app.notify(Notice::ExecutionSucceeded);
        let shown = app.toast.as_ref().unwrap().shown_at;
        app.expire_toast(shown + Duration::from_secs(1));
        assert!(app.toast.is_some());
        app.expire_toast(shown + TOAST_TTL);
        assert!(app.toast.is_none());
    }
}
