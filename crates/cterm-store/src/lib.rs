//! Persistence backends for cterm.
//!
//! The interpreter treats storage as an opaque string key-value store. It
//! writes serialized program state after every mutating command and reads it
//! back once at startup.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use cterm_types::error::{Result, TermError};

/// Opaque key-value persistence.
pub trait Store {
    /// Read the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// All stored keys in sorted order.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Reject keys that are empty or could escape a storage directory.
pub(crate) fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(TermError::Store("empty key".into()));
    }
    if key.contains('/') || key.contains('\\') || key.contains("..") {
        return Err(TermError::Store(format!("invalid key: {key}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keys_accepted() {
        assert!(check_key("cterm--programInput").is_ok());
        assert!(check_key("terminal-program").is_ok());
    }

    #[test]
    fn traversal_keys_rejected() {
        assert!(check_key("").is_err());
        assert!(check_key("../etc").is_err());
        assert!(check_key("a/b").is_err());
        assert!(check_key("a\\b").is_err());
    }
}
