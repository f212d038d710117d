//! Per-session interpreter state.
//!
//! Everything a running terminal mutates lives here rather than in globals,
//! so independent sessions (and tests) never share state.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use cterm_types::color::{Color, Theme};
use cterm_types::config::TerminalConfig;

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// Name to string value. Names are stored without the leading `$`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, String>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Program
// ---------------------------------------------------------------------------

/// A stored program: sparse line number to command text.
///
/// Empty lines are never stored; setting a line to empty text removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Program(BTreeMap<usize, String>);

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` at line `n`, or remove the line when `text` is empty.
    pub fn set_line(&mut self, n: usize, text: &str) {
        if text.is_empty() {
            self.0.remove(&n);
        } else {
            self.0.insert(n, text.to_string());
        }
    }

    pub fn line(&self, n: usize) -> Option<&str> {
        self.0.get(&n).map(String::as_str)
    }

    pub fn remove_line(&mut self, n: usize) -> Option<String> {
        self.0.remove(&n)
    }

    /// Relocate line `from` to `to`, replacing whatever was there.
    pub fn move_line(&mut self, from: usize, to: usize) -> Option<&str> {
        let text = self.0.remove(&from)?;
        self.0.insert(to, text);
        self.line(to)
    }

    /// First stored line at or after `n`.
    pub fn next_line(&self, n: usize) -> Option<(usize, &str)> {
        self.0
            .range(n..)
            .next()
            .map(|(&line, text)| (line, text.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(|(&line, text)| (line, text.as_str()))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `n text` lines in execution order.
    pub fn listing(&self) -> Vec<String> {
        self.iter().map(|(n, text)| format!("{n} {text}")).collect()
    }
}

// ---------------------------------------------------------------------------
// Persisted state
// ---------------------------------------------------------------------------

/// The slice of a session that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramState {
    #[serde(default)]
    pub input: Program,
    #[serde(default)]
    pub variables: Variables,
    /// Alias name (uppercase) to program snapshot.
    #[serde(default)]
    pub aliases: BTreeMap<String, Program>,
}

/// Borrowed view of [`ProgramState`] for serializing without cloning.
#[derive(Serialize)]
pub(crate) struct ProgramStateRef<'a> {
    pub input: &'a Program,
    pub variables: &'a Variables,
    pub aliases: &'a BTreeMap<String, Program>,
}

// ---------------------------------------------------------------------------
// Display settings
// ---------------------------------------------------------------------------

/// Console presentation settings changed by COLOR/THEME and read by SYSTEM.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub color: Color,
    pub theme: Theme,
    pub prompt: String,
    pub account: String,
    pub path: String,
    pub delay: Duration,
    pub debug: bool,
}

impl DisplayState {
    /// Color text is printed in: the theme's color when it forces one.
    pub fn text_color(&self) -> Color {
        self.theme.text_color().unwrap_or(self.color)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Flags saved and restored by [`crate::FlagGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionFlag {
    OutputSuppressed,
    Executing,
}

/// Mutable state of one terminal.
#[derive(Debug, Clone)]
pub struct Session {
    pub variables: Variables,
    pub program: Program,
    pub aliases: BTreeMap<String, Program>,
    /// Status of the most recent command; 0 is success.
    pub status: i32,
    /// Set while a sub-command runs for its value only.
    pub output_suppressed: bool,
    /// Set while a stored program, alias or FOR body runs.
    pub executing: bool,
    /// Set once the console reports a stop request; silences output until
    /// the request is consumed.
    pub stop_printing: bool,
    /// Nesting depth of program runs (aliases may invoke aliases).
    pub run_depth: usize,
    pub display: DisplayState,
}

impl Session {
    pub fn new(config: &TerminalConfig) -> Self {
        Self {
            variables: Variables::new(),
            program: Program::new(),
            aliases: BTreeMap::new(),
            status: 0,
            output_suppressed: false,
            executing: false,
            stop_printing: false,
            run_depth: 0,
            display: DisplayState {
                color: config.color,
                theme: config.theme,
                prompt: config.prompt.clone(),
                account: config.account.clone(),
                path: config.path.clone(),
                delay: Duration::from_millis(config.print_delay_ms),
                debug: config.debug,
            },
        }
    }

    pub(crate) fn flag_mut(&mut self, flag: SessionFlag) -> &mut bool {
        match flag {
            SessionFlag::OutputSuppressed => &mut self.output_suppressed,
            SessionFlag::Executing => &mut self.executing,
        }
    }

    pub(crate) fn state_ref(&self) -> ProgramStateRef<'_> {
        ProgramStateRef {
            input: &self.program,
            variables: &self.variables,
            aliases: &self.aliases,
        }
    }

    /// Replace the persisted slice with `state`.
    pub fn restore(&mut self, state: ProgramState) {
        self.program = state.input;
        self.variables = state.variables;
        self.aliases = state.aliases;
    }
}
