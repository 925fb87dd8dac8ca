//! GitHub API integration module
//!
//! This module provides all GitHub-related functionality:
//! - Authenticated client construction
//! - Repository contents (read and write one file)
//! - Branch listing
//! - Error classification
//! - The publish pipeline

pub mod branch;
pub mod client;
pub mod contents;
pub mod error_handler;
pub mod publish;

pub use branch::{BranchHandler, BranchInfo};
pub use client::GitHubClient;
pub use contents::{GitHubConnector, GitHubRemote, RemoteConnector, RemoteRepository};
pub use error_handler::classify_github_error;
pub use publish::{PublishError, PublishOutcome, PublishReport, Publisher};
