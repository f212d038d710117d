//! Error types for cterm.

use std::io;

/// Errors produced by the interpreter and its collaborators.
///
/// The `Display` form of each variant is exactly the message the terminal
/// prints at the command error boundary.
#[derive(Debug, thiserror::Error)]
pub enum TermError {
    #[error("Syntax error; {0}")]
    Syntax(String),

    #[error("Reference error; variable {0} does not exist.")]
    Reference(String),

    #[error("Runtime error; {0}")]
    Runtime(String),

    /// A plain user-facing failure with no category prefix.
    #[error("{0}")]
    Command(String),

    #[error("Cannot execute control command within a program.")]
    ControlInProgram,

    #[error("Invalid program line {0} specified.")]
    InvalidLine(String),

    #[error("Stack limit exceeded.")]
    StackLimit,

    /// A program line finished with a non-zero status.
    #[error("Execution error.")]
    Execution { status: i32 },

    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TermError {
    /// Status code recorded when this error reaches the command boundary.
    pub fn status(&self) -> i32 {
        match self {
            Self::Execution { status } if *status != 0 => *status,
            _ => 1,
        }
    }

    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TermError>;
