//! Terminal configuration, loaded from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::{Color, Theme};
use crate::error::{Result, TermError};

pub const MIN_COLUMNS: usize = 30;
pub const MAX_COLUMNS: usize = 100;
pub const MIN_ROWS: usize = 15;
pub const MAX_ROWS: usize = 100;

/// Settings for one terminal session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Character grid width.
    #[serde(default = "default_columns")]
    pub columns: usize,
    /// Character grid height.
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_account")]
    pub account: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub theme: Theme,
    /// Per-character print delay handed to the console.
    #[serde(default)]
    pub print_delay_ms: u64,
    /// Maximum GOTO jumps within one program run.
    #[serde(default = "default_jump_budget")]
    pub jump_budget: usize,
    /// Store key the program state is persisted under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Directory backing the JSON file store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub debug: bool,
}

fn default_columns() -> usize {
    60
}
fn default_rows() -> usize {
    25
}
fn default_prompt() -> String {
    "$".to_string()
}
fn default_account() -> String {
    "guest".to_string()
}
fn default_path() -> String {
    "/".to_string()
}
fn default_jump_budget() -> usize {
    100
}
fn default_storage_key() -> String {
    "cterm--programInput".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from(".cterm")
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            rows: default_rows(),
            prompt: default_prompt(),
            account: default_account(),
            path: default_path(),
            color: Color::default(),
            theme: Theme::default(),
            print_delay_ms: 0,
            jump_budget: default_jump_budget(),
            storage_key: default_storage_key(),
            data_dir: default_data_dir(),
            debug: false,
        }
    }
}

impl TerminalConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Check grid dimensions against the supported range.
    pub fn validate(&self) -> Result<()> {
        if self.columns < MIN_COLUMNS {
            return Err(TermError::Config(format!("Minimum of {MIN_COLUMNS} columns.")));
        }
        if self.columns > MAX_COLUMNS {
            return Err(TermError::Config(format!("Maximum of {MAX_COLUMNS} columns.")));
        }
        if self.rows < MIN_ROWS {
            return Err(TermError::Config(format!("Minimum of {MIN_ROWS} rows.")));
        }
        if self.rows > MAX_ROWS {
            return Err(TermError::Config(format!("Maximum of {MAX_ROWS} rows.")));
        }
        if self.jump_budget == 0 {
            return Err(TermError::Config("jump_budget must be at least 1.".into()));
        }
        Ok(())
    }
}
