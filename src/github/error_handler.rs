//! GitHub API error detection and classification
//!
//! Turns octocrab errors into `FigsyncError`s that say whether the token was
//! rejected, the remote changed underneath us, or the request simply failed.

use crate::error::FigsyncError;

/// HTTP status of a GitHub API error, if the error came from the API
pub fn status_of(err: &octocrab::Error) -> Option<u16> {
    match err {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

/// Classifies an octocrab error into a more specific FigsyncError if possible
pub fn classify_github_error(err: octocrab::Error) -> FigsyncError {
    match &err {
        octocrab::Error::GitHub { source, .. } => {
            classify_status(source.status_code.as_u16(), &source.message)
        }
        // Transport, serialization and URI errors: Display is informative here
        _ => FigsyncError::GitHubApi(err.to_string()),
    }
}

/// Classify an API error by status code and message
pub fn classify_status(status: u16, message: &str) -> FigsyncError {
    if is_rate_limit_error(status, message) {
        return FigsyncError::GitHubApi(
            "API rate limit exceeded. Please wait a few minutes and try again.".to_string(),
        );
    }

    match status {
        401 | 403 => FigsyncError::AuthRejected(message.to_string()),
        404 => FigsyncError::GitHubApi(
            "Repository not found. It may be private or you may not have access.".to_string(),
        ),
        409 => FigsyncError::Conflict(message.to_string()),
        422 if is_sha_conflict(message) => FigsyncError::Conflict(message.to_string()),
        _ => FigsyncError::GitHubApi(format!("{} ({})", message, status)),
    }
}

/// Check if error is a rate limit error
fn is_rate_limit_error(status: u16, message: &str) -> bool {
    (status == 403 || status == 429) && message.to_lowercase().contains("rate limit")
}

/// A 422 about the blob sha means the file appeared or moved since we read it
fn is_sha_conflict(message: &str) -> bool {
    message.contains("sha")
}
