//! Custom error types for figsync
//!
//! User-friendly error messages for all failure scenarios.

use thiserror::Error;

/// Main error type for the figsync application
#[derive(Error, Debug)]
pub enum FigsyncError {
    /// Not running in a git repository
    #[error("This directory is not a git repository.\n\n  → Run 'fgs config detect' from inside the repository you publish to, or set owner/repo by hand.")]
    NotGitRepository,

    /// No GitHub remote found
    #[error("No GitHub remote found in this repository.\n\n  → Make sure 'origin' points to a GitHub URL.\n  → Run 'git remote -v' to check your remotes.")]
    NoGitHubRemote,

    /// Invalid GitHub URL format
    #[error("Cannot parse GitHub URL: {0}\n\n  → Expected format: https://github.com/owner/repo or git@github.com:owner/repo")]
    InvalidGitHubUrl(String),

    /// GitHub API error
    #[error("GitHub API request failed: {0}\n\n  → Check your internet connection.\n  → Your token may have expired - set a new one with 'fgs config set token <TOKEN>'.")]
    GitHubApi(String),

    /// Token rejected by GitHub
    #[error("GitHub rejected the access token: {0}\n\n  → Set a new token with 'fgs config set token <TOKEN>'.")]
    AuthRejected(String),

    /// Repository not found or no access
    #[error("Cannot access repository '{owner}/{repo}'.\n\n  This could mean:\n  1. The repository doesn't exist\n  2. Your token has no access to this private repository")]
    RepoAccessDenied { owner: String, repo: String },

    /// Remote file changed between read and write
    #[error("The remote file changed while publishing: {0}\n\n  → Run 'fgs publish' again.")]
    Conflict(String),

    /// Publish finished without writing
    #[error("Publish failed: {0}")]
    Publish(#[from] crate::github::publish::PublishError),

    /// Git operation error
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    /// Credential storage error
    #[error("Cannot access secure storage: {0}\n\n  → On macOS: Make sure Keychain Access is available.\n  → On Linux: Ensure a secret service (like gnome-keyring) is running.")]
    Credential(String),

    /// Storage tier error (document or settings)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Host document could not be read
    #[error("Cannot read document '{path}': {reason}\n\n  → Pass the exported document with --document or FIGSYNC_DOCUMENT.")]
    Document { path: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),
}

impl From<keyring::Error> for FigsyncError {
    fn from(err: keyring::Error) -> Self {
        FigsyncError::Credential(err.to_string())
    }
}

impl From<toml::de::Error> for FigsyncError {
    fn from(err: toml::de::Error) -> Self {
        FigsyncError::Toml(err.to_string())
    }
}

impl From<octocrab::Error> for FigsyncError {
    fn from(err: octocrab::Error) -> Self {
        // Use the error handler to classify and provide actionable guidance
        crate::github::error_handler::classify_github_error(err)
    }
}

/// Result type alias using FigsyncError
pub type Result<T> = std::result::Result<T, FigsyncError>;
