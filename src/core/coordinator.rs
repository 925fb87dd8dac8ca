//! Config coordinator
//!
//! Splits one logical configuration across the two storage tiers on save and
//! joins it back together on load:
//! - `owner`, `repo`, `path`, `branch` go to the shared tier as a `Profile`
//! - the access token goes to the private tier as a `Credential`
//!
//! Both halves share the profile's id. The merged `LogicalConfig` is the only
//! shape the rest of the application sees and is never persisted itself.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::credentials::CredentialVault;
use crate::core::profile::{Profile, ProfileStore};
use crate::core::storage::StorageTier;
use crate::error::{FigsyncError, Result};

/// Merged view of the active profile and its credential
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LogicalConfig {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub owner: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub repo: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub path: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub branch: String,
    /// Access token. The UI form posts it as `auth`.
    #[serde(
        default,
        alias = "auth",
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub secret: Secret,
}

/// Access token wrapper with an empty default
#[derive(Clone)]
pub struct Secret(pub SecretString);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl Default for Secret {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl From<SecretString> for Secret {
    fn from(value: SecretString) -> Self {
        Self(value)
    }
}

fn serialize_secret<S>(secret: &Secret, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(secret.expose())
}

// The UI form sends null for fields it never filled in
fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Secret, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_text(deserializer).map(Secret::new)
}

impl fmt::Debug for LogicalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicalConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("path", &self.path)
            .field("branch", &self.branch)
            .field("secret", &if self.secret.is_empty() { "" } else { "[REDACTED]" })
            .finish()
    }
}

impl LogicalConfig {
    /// Names of the fields a publish cannot run without
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.owner.trim().is_empty() {
            missing.push("owner");
        }
        if self.repo.trim().is_empty() {
            missing.push("repo");
        }
        if self.secret.is_empty() {
            missing.push("token");
        }
        missing
    }

    /// `owner/repo`, or an empty string when either half is missing
    pub fn full_name(&self) -> String {
        if self.owner.is_empty() || self.repo.is_empty() {
            String::new()
        } else {
            format!("{}/{}", self.owner, self.repo)
        }
    }
}

/// A single field of the logical configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Owner,
    Repo,
    Path,
    Branch,
    Secret,
}

/// Joins the profile store and the credential vault
pub struct ConfigCoordinator {
    profiles: ProfileStore,
    vault: CredentialVault,
    /// Held across each read-modify-write of the profile
    update_lock: Mutex<()>,
}

impl ConfigCoordinator {
    /// Create a coordinator over a shared (document) tier and a private tier
    pub fn new(shared: Arc<dyn StorageTier>, private: Arc<dyn StorageTier>) -> Self {
        Self {
            profiles: ProfileStore::new(shared),
            vault: CredentialVault::new(private),
            update_lock: Mutex::new(()),
        }
    }

    /// Persist a logical configuration
    ///
    /// Empty fields are skipped, so a partial save never erases a value that
    /// was saved earlier. The profile keeps its id across saves; the first
    /// save mints one.
    pub fn save(&self, input: &LogicalConfig) -> Result<()> {
        let _guard = self.lock_updates()?;
        let existing = self.profiles.current()?;
        let is_new = existing.is_none();
        let mut profile = existing.unwrap_or_else(Profile::new);

        assign_if_present(&mut profile.owner, &input.owner);
        assign_if_present(&mut profile.repo, &input.repo);
        assign_if_present(&mut profile.path, &input.path);
        assign_if_present(&mut profile.branch, &input.branch);

        self.profiles.save(&profile)?;

        if !input.secret.is_empty() {
            self.vault.store(profile.id, &input.secret.0)?;
        }

        info!(profile_id = %profile.id, new_profile = is_new, "configuration saved");
        Ok(())
    }

    /// Read the merged configuration
    ///
    /// Never fails: missing or unreadable data comes back as empty fields.
    pub fn load(&self) -> LogicalConfig {
        let profile = match self.profiles.current() {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!("no saved profile");
                return LogicalConfig::default();
            }
            Err(e) => {
                warn!("failed to read profile: {}", e);
                return LogicalConfig::default();
            }
        };

        let secret = match self.vault.find(profile.id) {
            Ok(Some(secret)) => Secret::from(secret),
            Ok(None) => Secret::default(),
            Err(e) => {
                warn!("failed to read credential: {}", e);
                Secret::default()
            }
        };

        LogicalConfig {
            owner: profile.owner,
            repo: profile.repo,
            path: profile.path,
            branch: profile.branch,
            secret,
        }
    }

    /// Explicitly clear one field
    ///
    /// `save` treats empty values as "leave unchanged", so this is the only
    /// way to reset a field once it has been set.
    pub fn clear(&self, field: ConfigField) -> Result<()> {
        let _guard = self.lock_updates()?;
        let Some(mut profile) = self.profiles.current()? else {
            return Ok(());
        };

        match field {
            ConfigField::Secret => return self.vault.remove(profile.id),
            ConfigField::Owner => profile.owner.clear(),
            ConfigField::Repo => profile.repo.clear(),
            ConfigField::Path => profile.path.clear(),
            ConfigField::Branch => profile.branch.clear(),
        }

        self.profiles.save(&profile)
    }

    fn lock_updates(&self) -> Result<MutexGuard<'_, ()>> {
        self.update_lock
            .lock()
            .map_err(|_| FigsyncError::Storage("configuration lock poisoned".into()))
    }

    /// Id of the active profile, if any
    pub fn profile_id(&self) -> Option<Uuid> {
        self.profiles.current().ok().flatten().map(|p| p.id)
    }
}

fn assign_if_present(target: &mut String, value: &str) {
    if !value.is_empty() {
        *target = value.to_string();
    }
}

impl std::str::FromStr for ConfigField {
    type Err = FigsyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "owner" => Ok(ConfigField::Owner),
            "repo" => Ok(ConfigField::Repo),
            "path" => Ok(ConfigField::Path),
            "branch" => Ok(ConfigField::Branch),
            "secret" | "token" | "auth" => Ok(ConfigField::Secret),
            other => Err(FigsyncError::InvalidInput(format!(
                "Unknown configuration field '{}'",
                other
            ))),
        }
    }
}
