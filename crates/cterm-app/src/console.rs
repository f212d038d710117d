//! Terminal console on stdin/stdout.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ansi_term::Colour;

use cterm_terminal::Console;
use cterm_types::color::Color;

/// Console over the process's standard streams.
///
/// The cursor is tracked rather than queried: output wraps at `columns` and
/// scrolls at `rows`, the same grid the interpreter reports through SYSTEM.
pub struct StdConsole {
    columns: usize,
    rows: usize,
    cursor: (usize, usize),
    colored: bool,
    interrupted: Arc<AtomicBool>,
}

impl StdConsole {
    /// `interrupted` is raised by the Ctrl-C handler.
    pub fn new(columns: usize, rows: usize, colored: bool, interrupted: Arc<AtomicBool>) -> Self {
        Self {
            columns,
            rows,
            cursor: (0, 0),
            colored,
            interrupted,
        }
    }

    fn advance(&mut self, ch: char) {
        if ch == '\n' || self.cursor.0 + 1 >= self.columns {
            self.cursor = (0, self.cursor.1 + 1);
        } else {
            self.cursor.0 += 1;
        }
        self.cursor.1 = self.cursor.1.min(self.rows.saturating_sub(1));
    }

    fn write(&mut self, text: &str, color: Color) -> io::Result<()> {
        let mut out = io::stdout().lock();
        if self.colored {
            write!(out, "{}", Colour::Fixed(color.ansi_index()).paint(text))?;
        } else {
            out.write_all(text.as_bytes())?;
        }
        out.flush()
    }
}

impl Console for StdConsole {
    fn print(&mut self, text: &str, delay: Duration, color: Color) {
        let result = if delay.is_zero() {
            text.split_inclusive('\n').try_for_each(|chunk| {
                if self.interrupted.load(Ordering::SeqCst) {
                    return Ok(());
                }
                chunk.chars().for_each(|ch| self.advance(ch));
                self.write(chunk, color)
            })
        } else {
            let mut buf = [0u8; 4];
            text.chars().try_for_each(|ch| {
                if self.interrupted.load(Ordering::SeqCst) {
                    return Ok(());
                }
                self.advance(ch);
                self.write(ch.encode_utf8(&mut buf), color)?;
                std::thread::sleep(delay);
                Ok(())
            })
        };
        if let Err(e) = result {
            log::warn!("stdout write failed: {e}");
        }
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                // A Ctrl-C at the prompt must not stop the next command.
                self.interrupted.store(false, Ordering::SeqCst);
                self.cursor = (0, (self.cursor.1 + 1).min(self.rows.saturating_sub(1)));
                Some(line.trim_end_matches(['\r', '\n']).to_string())
            },
            Err(e) => {
                log::warn!("stdin read failed: {e}");
                None
            },
        }
    }

    fn clear(&mut self) {
        print!("\x1b[2J\x1b[H");
        let _ = io::stdout().flush();
        self.cursor = (0, 0);
    }

    fn set_cursor(&mut self, x: usize, y: usize) {
        print!("\x1b[{};{}H", y + 1, x + 1);
        let _ = io::stdout().flush();
        self.cursor = (x, y);
    }

    fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    fn size(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    fn stop_requested(&mut self) -> bool {
        self.interrupted.swap(false, Ordering::SeqCst)
    }
}
