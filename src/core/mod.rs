//! Core functionality for figsync
//!
//! This module contains the local side of the application:
//! - Storage tiers (private keyring, shared document)
//! - Credential vault and profile store
//! - Config coordinator joining the two
//! - Host document access and snapshot export
//! - Application settings
//! - Repository coordinate parsing and git origin detection

pub mod config;
pub mod coordinator;
pub mod credentials;
pub mod document;
pub mod git;
pub mod profile;
pub mod repository;
pub mod snapshot;
pub mod storage;

pub use config::Settings;
pub use coordinator::{ConfigCoordinator, ConfigField, LogicalConfig, Secret};
pub use credentials::{CredentialVault, KeyringStorage};
pub use document::DocumentFile;
pub use profile::{Profile, ProfileStore};
pub use repository::RepositoryCoordinates;
pub use snapshot::{Snapshot, SnapshotExporter, VariableSource};
pub use storage::{MemoryStorage, StorageTier};
