//! Profile store on the shared (document-scoped) tier

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::storage::StorageTier;
use crate::error::{FigsyncError, Result};

/// Shared-tier key holding the profile list
pub const PROFILES_KEY: &str = "profiles";

/// Non-secret connection profile for one remote target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Stable id, pairs the profile with its credential
    pub id: Uuid,
    /// Repository owner (user or organization)
    #[serde(default)]
    pub owner: String,
    /// Repository name
    #[serde(default)]
    pub repo: String,
    /// Target file path inside the repository
    #[serde(default)]
    pub path: String,
    /// Target branch, empty for the repository default
    #[serde(default)]
    pub branch: String,
}

impl Profile {
    /// An empty profile with a freshly minted id
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            owner: String::new(),
            repo: String::new(),
            path: String::new(),
            branch: String::new(),
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads and writes the active profile
///
/// Profiles are stored as a JSON array so more can be added later without a
/// format change. Only the first entry is in use.
pub struct ProfileStore {
    tier: Arc<dyn StorageTier>,
}

impl ProfileStore {
    pub fn new(tier: Arc<dyn StorageTier>) -> Self {
        Self { tier }
    }

    /// The active profile, if one has been saved
    pub fn current(&self) -> Result<Option<Profile>> {
        let Some(json) = self.tier.get(PROFILES_KEY)? else {
            return Ok(None);
        };

        let profiles: Vec<Profile> = serde_json::from_str(&json)
            .map_err(|e| FigsyncError::Storage(format!("Invalid stored profile: {}", e)))?;

        Ok(profiles.into_iter().next())
    }

    /// Replace the stored profile
    pub fn save(&self, profile: &Profile) -> Result<()> {
        let json = serde_json::to_string(&[profile])?;
        self.tier.set(PROFILES_KEY, &json)
    }
}
