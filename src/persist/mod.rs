//! # Persistence Layer
//!
//! Durable storage for phrases, theme, and preferences, across process
//! restarts. The only I/O surface is a string key-value store, abstracted
//! behind the [`KeyValueStore`] trait:
//!
//! - [`fs::FileBackend`]: production storage, one file per key under a
//!   data directory.
//! - [`memory::MemoryBackend`]: in-memory storage for tests, with an
//!   optional byte capacity to exercise quota handling.
//!
//! [`gateway::StorageGateway`] layers the domain contracts on top: JSON
//! encoding, corruption recovery on load, quota-triggered pruning on save,
//! and the export/import envelope. Failures come back as tagged
//! [`crate::error::AppError`] values, never as panics.

use thiserror::Error;

pub mod fs;
pub mod gateway;
pub mod memory;

pub use fs::FileBackend;
pub use gateway::{ExportEnvelope, Preferences, StorageGateway};
pub use memory::MemoryBackend;

/// Storage keys owned by this subsystem.
pub mod keys {
    pub const PHRASES: &str = "phrase_manager_phrases";
    pub const THEME: &str = "phrase_manager_theme";
    pub const PREFERENCES: &str = "phrase_manager_preferences";
    pub const LOCALE: &str = "app_locale";
    pub const RECENT_SEARCHES: &str = "phrase-manager-recent-searches";

    pub const ALL: [&str; 5] = [PHRASES, THEME, PREFERENCES, LOCALE, RECENT_SEARCHES];
}

/// Failures a backend can produce. Quota exhaustion is its own variant so
/// the gateway can react with a cleanup pass instead of giving up.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("storage quota exceeded writing {key} ({attempted} bytes)")]
    QuotaExceeded { key: String, attempted: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstract string key-value store.
pub trait KeyValueStore {
    /// Read a value; absence is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError>;

    /// Removing a missing key is a no-op.
    fn remove(&mut self, key: &str) -> Result<(), KvError>;
}
