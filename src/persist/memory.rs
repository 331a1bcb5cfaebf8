use super::{KeyValueStore, KvError};
use std::collections::HashMap;

/// In-memory key-value storage for testing and development.
/// Does NOT persist data.
///
/// An optional byte capacity (sum of key and value lengths, mirroring how
/// browser storage quotas are accounted) lets tests provoke
/// [`KvError::QuotaExceeded`] deterministically.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
    capacity_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_bytes(capacity_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity_bytes: Some(capacity_bytes),
        }
    }

    /// Total bytes currently stored, keys included.
    pub fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        if let Some(capacity) = self.capacity_bytes {
            let existing = self.entries.get(key).map_or(0, |v| key.len() + v.len());
            let prospective = self.used_bytes() - existing + key.len() + value.len();
            if prospective > capacity {
                return Err(KvError::QuotaExceeded {
                    key: key.to_string(),
                    attempted: value.len(),
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), KvError> {
        self.entries.remove(key);
        Ok(())
    }
}
