//! Render/IO interface between the interpreter and whatever draws it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use cterm_types::color::{Color, Theme};

/// A character console the terminal prints to and reads lines from.
pub trait Console {
    /// Emit `text`, waiting `delay` per character when the console animates.
    fn print(&mut self, text: &str, delay: Duration, color: Color);

    /// Block for one line of user input. `None` means input is closed.
    fn read_line(&mut self) -> Option<String>;

    /// Clear the screen and home the cursor.
    fn clear(&mut self);

    fn set_cursor(&mut self, x: usize, y: usize);

    fn cursor(&self) -> (usize, usize);

    /// `(columns, rows)`.
    fn size(&self) -> (usize, usize);

    fn set_theme(&mut self, _theme: Theme) {}

    /// Whether the user asked to abort output. Reading clears the request.
    fn stop_requested(&mut self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct Buffer {
    output: String,
    input: VecDeque<String>,
    cursor: (usize, usize),
    theme: Theme,
    prints: usize,
    stop_after: Option<usize>,
}

/// In-memory console.
///
/// Clones share one buffer, so a test can hand a clone to the terminal and
/// keep another to inspect the transcript.
#[derive(Debug, Clone)]
pub struct BufferConsole {
    columns: usize,
    rows: usize,
    inner: Rc<RefCell<Buffer>>,
}

impl BufferConsole {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            inner: Rc::new(RefCell::new(Buffer::default())),
        }
    }

    /// Queue a line for `read_line`.
    pub fn push_input(&self, line: &str) {
        self.inner.borrow_mut().input.push_back(line.to_string());
    }

    /// Everything printed so far.
    pub fn output(&self) -> String {
        self.inner.borrow().output.clone()
    }

    /// Return and forget everything printed so far.
    pub fn take_output(&self) -> String {
        std::mem::take(&mut self.inner.borrow_mut().output)
    }

    pub fn theme(&self) -> Theme {
        self.inner.borrow().theme
    }

    /// Request a stop once `n` print calls have been made.
    pub fn stop_after(&self, n: usize) {
        self.inner.borrow_mut().stop_after = Some(n);
    }

    fn advance(&self, buf: &mut Buffer, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                buf.cursor = (0, buf.cursor.1 + 1);
            } else if buf.cursor.0 + 1 >= self.columns {
                buf.cursor = (0, buf.cursor.1 + 1);
            } else {
                buf.cursor.0 += 1;
            }
        }
        // Scrolling keeps the cursor on the last row.
        buf.cursor.1 = buf.cursor.1.min(self.rows.saturating_sub(1));
    }
}

impl Console for BufferConsole {
    fn print(&mut self, text: &str, _delay: Duration, _color: Color) {
        let mut buf = self.inner.borrow_mut();
        buf.output.push_str(text);
        buf.prints += 1;
        self.advance(&mut buf, text);
    }

    fn read_line(&mut self) -> Option<String> {
        self.inner.borrow_mut().input.pop_front()
    }

    fn clear(&mut self) {
        let mut buf = self.inner.borrow_mut();
        buf.output.clear();
        buf.cursor = (0, 0);
    }

    fn set_cursor(&mut self, x: usize, y: usize) {
        self.inner.borrow_mut().cursor = (x, y);
    }

    fn cursor(&self) -> (usize, usize) {
        self.inner.borrow().cursor
    }

    fn size(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    fn set_theme(&mut self, theme: Theme) {
        self.inner.borrow_mut().theme = theme;
    }

    fn stop_requested(&mut self) -> bool {
        let mut buf = self.inner.borrow_mut();
        match buf.stop_after {
            Some(n) if buf.prints >= n => {
                buf.stop_after = None;
                true
            },
            _ => false,
        }
    }
}
