//! Command trait, registry, dispatcher and program runner.
//!
//! A [`Terminal`] owns one session. `process_cmd` resolves the first word of a
//! line to a registered command, then to a saved alias, then to a numbered
//! program line. Failures never escape a command: they are reported through
//! [`Terminal::fail`], which records the status, prints the message and hands
//! back the [`FAILURE`] sentinel.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use cterm_store::Store;
use cterm_types::config::TerminalConfig;
use cterm_types::error::{Result, TermError};

use crate::console::Console;
use crate::session::{Program, ProgramState, Session, SessionFlag};

/// Text returned by a command that failed. The status code is authoritative.
pub const FAILURE: &str = "ERROR";

/// Commands a stored program may not run.
const FORBIDDEN_IN_PROGRAM: [&str; 4] = ["RUN", "MOVE", "DELETE", "SAVE"];

/// Deepest allowed nesting of program runs (aliases calling aliases).
const MAX_RUN_DEPTH: usize = 32;

/// Result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Continue with this value.
    Text(String),
    /// Continue the running program at this line.
    Jump(usize),
    /// Stop the running program, or the input loop.
    Exit,
}

impl CommandOutput {
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

/// Substitution form. Jumps and exits keep their historical wire format
/// (`GOTO:n`, `EXIT`) when a control command is used as a value.
impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Jump(line) => write!(f, "GOTO:{line}"),
            Self::Exit => f.write_str("EXIT"),
        }
    }
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types), uppercase.
    fn name(&self) -> &str;

    /// Argument name hints shown by `HELP <cmd>`.
    fn args(&self) -> &'static [&'static str] {
        &[]
    }

    /// Help text for `HELP <cmd>`.
    fn help(&self) -> &str;

    /// Hidden commands are left out of the `HELP` listing.
    fn hidden(&self) -> bool {
        false
    }

    /// Listed by `HELP PROGRAM`.
    fn program(&self) -> bool {
        false
    }

    /// Tab completion for a line starting with this command.
    fn complete(&self, _args: &[String], _term: &Terminal) -> Option<String> {
        None
    }

    /// Run with the raw space-split line; `args[0]` is the command word.
    fn execute(&self, args: &[String], term: &mut Terminal) -> Result<CommandOutput>;
}

/// Registry of available commands, keyed by uppercase name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_uppercase(), cmd);
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(&name.to_uppercase()).map(|c| c.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_uppercase())
    }

    /// All commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.values().map(|c| c.as_ref())
    }

    /// (name, help) pairs sorted by name.
    pub fn list_commands(&self) -> Vec<(&str, &str)> {
        self.iter().map(|c| (c.name(), c.help())).collect()
    }

    /// Visible command names starting with `partial` (case-insensitive).
    pub fn completions(&self, partial: &str) -> Vec<String> {
        let upper = partial.to_uppercase();
        self.commands
            .iter()
            .filter(|(name, cmd)| name.starts_with(&upper) && !cmd.hidden())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// One interpreter session wired to a console and a store.
pub struct Terminal {
    registry: Rc<CommandRegistry>,
    pub session: Session,
    console: Box<dyn Console>,
    store: Box<dyn Store>,
    config: TerminalConfig,
    rng: StdRng,
}

impl Terminal {
    pub fn new(
        registry: CommandRegistry,
        console: Box<dyn Console>,
        store: Box<dyn Store>,
        config: TerminalConfig,
    ) -> Self {
        Self {
            registry: Rc::new(registry),
            session: Session::new(&config),
            console,
            store,
            config,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn registry(&self) -> Rc<CommandRegistry> {
        Rc::clone(&self.registry)
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn console(&self) -> &dyn Console {
        self.console.as_ref()
    }

    pub fn console_mut(&mut self) -> &mut dyn Console {
        self.console.as_mut()
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn Store {
        self.store.as_mut()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Make `RND` reproducible.
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    // -- Output --

    /// Print in the session color unless output is suppressed or stopped.
    ///
    /// A stop request from the console silences output until the request is
    /// consumed by [`Terminal::take_stop_request`] or the next prompt.
    pub fn print(&mut self, text: &str) {
        if self.session.output_suppressed || self.session.stop_printing {
            return;
        }
        if self.console.stop_requested() {
            log::debug!("Output stopped by request");
            self.session.stop_printing = true;
            return;
        }
        let display = &self.session.display;
        self.console.print(text, display.delay, display.text_color());
    }

    pub fn println(&mut self, text: &str) {
        self.print(&format!("{text}\n"));
    }

    /// `account:path$ `.
    pub fn print_prompt(&mut self) {
        let display = &self.session.display;
        let prompt = format!("{}:{}{} ", display.account, display.path, display.prompt);
        self.print(&prompt);
    }

    // -- Error boundary --

    /// Record `err`'s status, print its message and return the failure
    /// sentinel.
    pub fn fail(&mut self, err: TermError) -> CommandOutput {
        self.session.status = err.status();
        let msg = err.to_string();
        log::debug!("Command failed with status {}: {msg}", self.session.status);
        self.println(&msg);
        CommandOutput::text(FAILURE)
    }

    // -- Scoped flags --

    /// Suppress output until the returned guard drops.
    pub fn suppress_output(&mut self) -> FlagGuard<'_> {
        FlagGuard::set(self, SessionFlag::OutputSuppressed)
    }

    /// Mark a program as executing until the returned guard drops.
    pub fn enter_program(&mut self) -> FlagGuard<'_> {
        FlagGuard::set(self, SessionFlag::Executing)
    }

    /// Refuse commands that may not run while a program executes.
    pub fn ensure_not_executing(&self) -> Result<()> {
        if self.session.executing {
            return Err(TermError::ControlInProgram);
        }
        Ok(())
    }

    // -- Dispatch --

    /// Execute one line and return its result. The session status is set as a
    /// side effect: 0 on success.
    pub fn process_cmd(&mut self, text: &str) -> CommandOutput {
        let text = text.trim();
        if text.is_empty() {
            return CommandOutput::empty();
        }
        log::debug!("Incoming command: {text}");
        self.session.status = 0;

        let args: Vec<String> = text.split(' ').map(String::from).collect();
        let word = args[0].to_uppercase();

        let registry = Rc::clone(&self.registry);
        if let Some(cmd) = registry.get(&word) {
            return match cmd.execute(&args, self) {
                Ok(out) => out,
                Err(e) => self.fail(e),
            };
        }

        if let Some(program) = self.session.aliases.get(&word).cloned() {
            log::debug!("Running alias {word}");
            let result = self.run(&program);
            self.save_program_state();
            return match result {
                Ok(()) => CommandOutput::empty(),
                Err(e) => self.fail(e),
            };
        }

        if let Ok(line) = args[0].parse::<usize>() {
            let rest = args[1..].join(" ");
            self.session.program.set_line(line, &rest);
            self.save_program_state();
            return CommandOutput::Text(rest);
        }

        let msg = format!("\"{}\" is not recognized as a valid command.", args[0]);
        self.session.status = 1;
        self.println(&msg);
        CommandOutput::Text(msg)
    }

    /// Execute a stored program from its lowest line.
    ///
    /// Stops cleanly on `EXIT` or a stop request. Forbidden commands, bad
    /// jump targets, an exhausted jump budget and any failing line abort the
    /// whole run.
    pub fn run(&mut self, program: &Program) -> Result<()> {
        if self.session.run_depth >= MAX_RUN_DEPTH {
            return Err(TermError::StackLimit);
        }
        self.session.run_depth += 1;
        let result = self.enter_program().run_lines(program);
        self.session.run_depth -= 1;
        result
    }

    fn run_lines(&mut self, program: &Program) -> Result<()> {
        let mut budget = self.config.jump_budget;
        // `None` once the cursor would pass the highest representable line.
        let mut cursor = Some(0);

        while let Some((line, text)) = cursor.and_then(|c| program.next_line(c)) {
            let word = text.split(' ').next().unwrap_or_default().to_uppercase();
            if FORBIDDEN_IN_PROGRAM.contains(&word.as_str()) {
                return Err(TermError::ControlInProgram);
            }

            let out = self.process_cmd(text);
            cursor = line.checked_add(1);
            match out {
                CommandOutput::Jump(target) => {
                    if program.line(target).is_none() {
                        return Err(TermError::InvalidLine(target.to_string()));
                    }
                    budget = budget.saturating_sub(1);
                    if budget == 0 {
                        return Err(TermError::StackLimit);
                    }
                    log::debug!("Jump from line {line} to {target} ({budget} left)");
                    cursor = Some(target);
                },
                CommandOutput::Exit => return Ok(()),
                CommandOutput::Text(_) => {},
            }

            if self.take_stop_request() {
                return Ok(());
            }
            if self.session.status != 0 {
                return Err(TermError::Execution {
                    status: self.session.status,
                });
            }
        }
        Ok(())
    }

    /// Consume a pending stop request from the session or the console.
    pub fn take_stop_request(&mut self) -> bool {
        let requested = self.console.stop_requested() || self.session.stop_printing;
        self.session.stop_printing = false;
        requested
    }

    // -- Completion --

    /// Complete a partially typed line.
    ///
    /// A lone word completes against command and alias names when exactly one
    /// matches; anything longer is handed to the command's own hook.
    pub fn complete(&self, line: &str) -> Option<String> {
        let args: Vec<String> = line.split(' ').map(String::from).collect();
        if args.len() == 1 {
            let upper = args[0].to_uppercase();
            let mut matches = self.registry.completions(&args[0]);
            matches.extend(
                self.session
                    .aliases
                    .keys()
                    .filter(|name| name.starts_with(&upper))
                    .cloned(),
            );
            return match matches.as_slice() {
                [only] => Some(only.clone()),
                _ => None,
            };
        }
        self.registry.get(&args[0])?.complete(&args, self)
    }

    // -- Persistence --

    /// Write variables, program and aliases to the store. Failures are logged,
    /// never surfaced to the command that triggered the save.
    pub fn save_program_state(&mut self) {
        let json = match serde_json::to_string(&self.session.state_ref()) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize program state: {e}");
                return;
            },
        };
        if let Err(e) = self.store.save(&self.config.storage_key, &json) {
            log::warn!("Failed to save program state: {e}");
        }
    }

    /// Load persisted state, if any. Returns whether anything was restored.
    pub fn restore_program_state(&mut self) -> Result<bool> {
        let Some(json) = self.store.load(&self.config.storage_key)? else {
            return Ok(false);
        };
        let state: ProgramState = serde_json::from_str(&json)?;
        log::info!(
            "Restored {} program lines, {} variables, {} aliases",
            state.input.len(),
            state.variables.len(),
            state.aliases.len()
        );
        self.session.restore(state);
        Ok(true)
    }

    // -- Input loop --

    /// Prompt, read and dispatch lines until input closes or `EXIT` runs.
    /// Returns the final status.
    pub fn run_input_loop(&mut self) -> i32 {
        loop {
            self.session.stop_printing = false;
            self.print_prompt();
            let Some(line) = self.console.read_line() else {
                break;
            };
            let out = self.process_cmd(&line);
            let status = self.session.status;
            if status != 0 {
                self.println(&format!("Command returned non-zero status code: {status}"));
            }
            if out == CommandOutput::Exit {
                break;
            }
        }
        self.session.status
    }
}

// ---------------------------------------------------------------------------
// FlagGuard
// ---------------------------------------------------------------------------

/// Sets a session flag and restores its previous value when dropped, on every
/// exit path. Derefs to the terminal so nested calls go through the guard.
pub struct FlagGuard<'t> {
    term: &'t mut Terminal,
    flag: SessionFlag,
    saved: bool,
}

impl<'t> FlagGuard<'t> {
    fn set(term: &'t mut Terminal, flag: SessionFlag) -> Self {
        let saved = std::mem::replace(term.session.flag_mut(flag), true);
        Self { term, flag, saved }
    }
}

impl Deref for FlagGuard<'_> {
    type Target = Terminal;

    fn deref(&self) -> &Terminal {
        self.term
    }
}

impl DerefMut for FlagGuard<'_> {
    fn deref_mut(&mut self) -> &mut Terminal {
        self.term
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        *self.term.session.flag_mut(self.flag) = self.saved;
    }
}
