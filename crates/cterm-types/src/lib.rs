//! Foundation types for cterm.
//!
//! Shared by every cterm crate: the error enum and `Result` alias, the
//! TOML-backed terminal configuration, and the display colors and themes the
//! console renders with.

pub mod color;
pub mod config;
pub mod error;
