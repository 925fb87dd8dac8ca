//! Credential vault backed by the system keyring
//!
//! The access token is the only secret figsync handles. It lives in the
//! private storage tier (macOS Keychain, Linux Secret Service) and is never
//! written into the shared document.
//!
//! Credentials are stored as a JSON array of `{id, secret}` records under a
//! single keyring entry. The `id` pairs each credential with the profile it
//! belongs to; a credential whose id matches no profile is never returned.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use keyring::Entry;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::storage::StorageTier;
use crate::error::{FigsyncError, Result};

const SERVICE_NAME: &str = "figsync";

/// Private-tier key holding the credential records
pub const CREDENTIALS_KEY: &str = "credentials";

/// A secret paired with a profile id
#[derive(Debug, Clone)]
pub struct Credential {
    /// Id of the profile this secret belongs to
    pub id: Uuid,
    /// The access token
    pub secret: SecretString,
}

/// On-disk shape of a credential record
#[derive(Serialize, Deserialize)]
struct StoredCredential {
    id: Uuid,
    secret: String,
}

impl From<StoredCredential> for Credential {
    fn from(stored: StoredCredential) -> Self {
        Self {
            id: stored.id,
            secret: SecretString::from(stored.secret),
        }
    }
}

impl From<&Credential> for StoredCredential {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id,
            secret: credential.secret.expose_secret().to_string(),
        }
    }
}

/// Credential vault over a private storage tier
pub struct CredentialVault {
    tier: Arc<dyn StorageTier>,
}

impl CredentialVault {
    /// Create a vault over the given tier
    pub fn new(tier: Arc<dyn StorageTier>) -> Self {
        Self { tier }
    }

    /// Create a vault over the system keyring
    pub fn system() -> Self {
        Self::new(Arc::new(KeyringStorage::new()))
    }

    /// All stored credentials
    pub fn list(&self) -> Result<Vec<Credential>> {
        let Some(json) = self.tier.get(CREDENTIALS_KEY)? else {
            return Ok(Vec::new());
        };

        let stored: Vec<StoredCredential> = serde_json::from_str(&json)
            .map_err(|e| FigsyncError::Credential(format!("Invalid stored credentials: {}", e)))?;

        Ok(stored.into_iter().map(Credential::from).collect())
    }

    /// Secret for the given profile id, `None` if no record carries that id
    pub fn find(&self, id: Uuid) -> Result<Option<SecretString>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|c| c.id == id)
            .map(|c| c.secret))
    }

    /// Store the secret for a profile
    ///
    /// Only one profile is retained, so this replaces every other record.
    pub fn store(&self, id: Uuid, secret: &SecretString) -> Result<()> {
        let records = [StoredCredential::from(&Credential {
            id,
            secret: secret.clone(),
        })];

        let json = serde_json::to_string(&records).map_err(|e| {
            FigsyncError::Credential(format!("Failed to serialize credentials: {}", e))
        })?;

        self.tier.set(CREDENTIALS_KEY, &json)
    }

    /// Remove the secret for a profile, keeping any other records
    pub fn remove(&self, id: Uuid) -> Result<()> {
        let remaining: Vec<StoredCredential> = self
            .list()?
            .iter()
            .filter(|c| c.id != id)
            .map(StoredCredential::from)
            .collect();

        if remaining.is_empty() {
            return self.tier.delete(CREDENTIALS_KEY);
        }

        let json = serde_json::to_string(&remaining)?;
        self.tier.set(CREDENTIALS_KEY, &json)
    }

    /// Get a masked version of a token for display (shows first 4 and last 4 chars)
    pub fn mask_token(token: &SecretString) -> String {
        let exposed = token.expose_secret();
        if exposed.chars().count() <= 8 {
            "*".repeat(exposed.chars().count())
        } else {
            let head: String = exposed.chars().take(4).collect();
            let tail: String = exposed
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("{}...{}", head, tail)
        }
    }
}

/// Private storage tier on the system keyring
///
/// Keeps an in-memory cache to minimize keychain prompts.
// Cache values:
//   - missing key = not yet fetched from keyring
//   - Some(None) = fetched, but no entry exists
//   - Some(Some(value)) = fetched and cached
#[derive(Default)]
pub struct KeyringStorage {
    cache: RwLock<HashMap<String, Option<String>>>,
}

impl KeyringStorage {
    /// Create a keyring-backed tier
    pub fn new() -> Self {
        Self::default()
    }

    fn cache_put(&self, key: &str, value: Option<String>) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key.to_string(), value);
        }
    }
}

impl StorageTier for KeyringStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if let Ok(cache) = self.cache.read() {
            if let Some(cached) = cache.get(key) {
                return Ok(cached.clone());
            }
        }

        let entry = Entry::new(SERVICE_NAME, key)?;
        let result = match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                return Err(FigsyncError::Credential(format!(
                    "Cannot access system keychain. Make sure your keyring is unlocked. ({})",
                    e
                )))
            }
        };

        self.cache_put(key, result.clone());
        Ok(result)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, key)?;
        entry.set_password(value)?;

        self.cache_put(key, Some(value.to_string()));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, key)?;
        let result = match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already deleted
            Err(e) => Err(FigsyncError::Credential(e.to_string())),
        };

        self.cache_put(key, None);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStorage;

    #[test]
    fn test_mask_token() {
        let short = SecretString::from("abc");
        assert_eq!(CredentialVault::mask_token(&short), "***");

        let long = SecretString::from("ghp_1234567890abcdef");
        assert_eq!(CredentialVault::mask_token(&long), "ghp_...cdef");
    }

    #[test]
    fn test_find_joins_on_id() {
        let vault = CredentialVault::new(Arc::new(MemoryStorage::new()));
        let id = Uuid::now_v7();

        vault.store(id, &SecretString::from("tok_123")).unwrap();

        let found = vault.find(id).unwrap().unwrap();
        assert_eq!(found.expose_secret(), "tok_123");
        assert!(vault.find(Uuid::now_v7()).unwrap().is_none());
    }

    #[test]
    fn test_store_keeps_single_record() {
        let vault = CredentialVault::new(Arc::new(MemoryStorage::new()));
        let first = Uuid::now_v7();
        let second = Uuid::now_v7();

        vault.store(first, &SecretString::from("one")).unwrap();
        vault.store(second, &SecretString::from("two")).unwrap();

        let all = vault.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, second);
    }

    #[test]
    fn test_remove_drops_entry() {
        let tier = Arc::new(MemoryStorage::new());
        let vault = CredentialVault::new(tier.clone());
        let id = Uuid::now_v7();

        vault.store(id, &SecretString::from("tok")).unwrap();
        vault.remove(id).unwrap();

        assert!(vault.list().unwrap().is_empty());
        assert_eq!(tier.get(CREDENTIALS_KEY).unwrap(), None);
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let vault = CredentialVault::new(Arc::new(MemoryStorage::with_entries([(
            CREDENTIALS_KEY,
            "not json",
        )])));
        assert!(vault.list().is_err());
    }
}
