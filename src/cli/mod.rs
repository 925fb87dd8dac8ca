//! CLI module for figsync
//!
//! This module contains all CLI command definitions and handlers using clap.

pub mod branch;
pub mod commands;
pub mod config;
pub mod export;
pub mod publish;
pub mod serve;

use std::path::Path;
use std::sync::Arc;

use crate::core::coordinator::ConfigCoordinator;
use crate::core::credentials::KeyringStorage;
use crate::core::document::DocumentFile;

pub use commands::{Cli, Commands};

/// Open the host document
pub fn open_document(path: &Path) -> Arc<DocumentFile> {
    Arc::new(DocumentFile::open(path))
}

/// Coordinator over the document's plugin data and the system keyring
pub fn coordinator_for(document: Arc<DocumentFile>) -> ConfigCoordinator {
    ConfigCoordinator::new(document, Arc::new(KeyringStorage::new()))
}

/// Shorthand for commands that only touch configuration
pub fn coordinator(path: &Path) -> ConfigCoordinator {
    coordinator_for(open_document(path))
}
