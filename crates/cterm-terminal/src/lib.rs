//! Command interpreter and terminal core.
//!
//! Every input line goes through the [`Terminal`] dispatcher. Registered
//! commands tokenize their own arguments: `$name` variable references,
//! `"quoted"` literals and `(parenthesized)` sub-commands are replaced with
//! placeholders, then resolved, with sub-commands re-entering the dispatcher
//! while output is suppressed. Numbered lines build a stored program that
//! `RUN` executes with `GOTO` jumps under a fixed jump budget.

mod commands;
mod console;
mod control_commands;
mod evaluator;
pub mod flags;
pub mod format;
mod interpreter;
mod math_commands;
pub mod numeric;
mod program_commands;
mod session;
pub mod tokenizer;
mod var_commands;

#[cfg(test)]
pub(crate) mod test_utils;

/// Register all built-in commands into a registry.
pub use commands::register_builtins;
/// Render/IO interface and its in-memory implementation.
pub use console::{BufferConsole, Console};
/// A single executable command trait.
pub use interpreter::Command;
/// Result of running a command: text, a jump, or an exit request.
pub use interpreter::CommandOutput;
/// Registry of available commands.
pub use interpreter::CommandRegistry;
/// Scoped guard restoring a session flag on drop.
pub use interpreter::FlagGuard;
/// The dispatcher, program runner and session owner.
pub use interpreter::Terminal;
/// Sentinel returned by a command that failed at the error boundary.
pub use interpreter::FAILURE;
/// Session state: variables, stored program, aliases.
pub use session::{DisplayState, Program, ProgramState, Session, Variables};
