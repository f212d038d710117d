//! cterm entry point.
//!
//! Loads `cterm.toml` (or the file named by the first argument), restores the
//! saved session from the data directory and runs the interactive prompt.
//! Ctrl-C stops a running program or slow output instead of the process.

mod console;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use cterm_store::FileStore;
use cterm_terminal::{CommandRegistry, Terminal, register_builtins};
use cterm_types::config::TerminalConfig;

use console::StdConsole;

const DEFAULT_CONFIG: &str = "cterm.toml";

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = TerminalConfig::load(&config_path)?;

    let level = if config.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    log::info!(
        "Starting cterm ({}x{}, config {})",
        config.columns,
        config.rows,
        config_path.display()
    );

    let interrupted = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))?;

    let console = StdConsole::new(
        config.columns,
        config.rows,
        io::stdout().is_terminal(),
        interrupted,
    );
    let store = FileStore::new(&config.data_dir);
    log::info!("Session data in {}", store.root().display());

    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry);
    let mut term = Terminal::new(registry, Box::new(console), Box::new(store), config);

    match term.restore_program_state() {
        Ok(true) => {},
        Ok(false) => log::info!("No saved session, starting fresh"),
        Err(e) => log::warn!("Could not restore saved session: {e}"),
    }

    let status = term.run_input_loop();
    log::info!("Exiting with status {status}");
    if status != 0 {
        std::process::exit(status);
    }
    Ok(())
}
