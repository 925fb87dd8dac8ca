//! Key/value storage tiers
//!
//! figsync keeps its state in two places with different guarantees:
//! - a **private** tier that lives only on this installation (the OS keyring)
//! - a **shared** tier that travels with the design document
//!
//! Both are plain string key/value stores. Values are JSON documents written
//! and read by the stores built on top (`CredentialVault`, `ProfileStore`).

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{FigsyncError, Result};

/// A string key/value storage tier
pub trait StorageTier: Send + Sync {
    /// Read a value, `None` if the key has never been written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory storage tier
///
/// Used for throwaway sessions and tests. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl StorageTier for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| FigsyncError::Storage("memory store lock poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| FigsyncError::Storage("memory store lock poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| FigsyncError::Storage("memory store lock poisoned".into()))?;
        values.remove(key);
        Ok(())
    }
}
