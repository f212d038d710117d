//! Shared helpers for the crate's unit tests.

use cterm_store::MemoryStore;
use cterm_types::config::TerminalConfig;

use crate::console::BufferConsole;
use crate::interpreter::{CommandRegistry, Terminal};

/// Terminal over `registry` with an in-memory console and store.
pub fn bare_terminal(registry: CommandRegistry) -> (Terminal, BufferConsole) {
    let config = TerminalConfig::default();
    let console = BufferConsole::new(config.columns, config.rows);
    let term = Terminal::new(
        registry,
        Box::new(console.clone()),
        Box::new(MemoryStore::new()),
        config,
    );
    (term, console)
}

/// Terminal with every built-in command registered.
pub fn terminal() -> (Terminal, BufferConsole) {
    let mut registry = CommandRegistry::new();
    crate::register_builtins(&mut registry);
    bare_terminal(registry)
}

/// Dispatch each line in turn.
pub fn run_lines(term: &mut Terminal, lines: &[&str]) {
    for line in lines {
        term.process_cmd(line);
    }
}

/// Clear the transcript, dispatch `cmd` and return what it printed.
pub fn output_of(term: &mut Terminal, console: &BufferConsole, cmd: &str) -> String {
    console.take_output();
    term.process_cmd(cmd);
    console.take_output()
}
