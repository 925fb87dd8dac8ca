//! figsync - publish design variables to GitHub
//!
//! This library keeps a design document's connection settings split across a
//! shared tier (inside the document) and a private tier (the system keyring),
//! exports the document's variables as a deterministic snapshot, and publishes
//! that snapshot to a GitHub repository idempotently.

pub mod cli;
pub mod core;
pub mod error;
pub mod github;
pub mod router;

pub use error::{FigsyncError, Result};
