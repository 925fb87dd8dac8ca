//! Repository coordinates
//!
//! Parses and validates the `owner/repo` pair a profile publishes to, either
//! typed by the user or detected from the local git `origin` remote.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::core::git::GitRepository;
use crate::error::{FigsyncError, Result};

/// GitHub user and organization names
static OWNER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,38})$").expect("Invalid regex pattern for owner")
});

/// GitHub repository names
static REPO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]{1,100}$").expect("Invalid regex pattern for repository")
});

/// Owner and name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCoordinates {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepositoryCoordinates {
    /// Build coordinates after validating both halves
    pub fn new(owner: &str, name: &str) -> Result<Self> {
        validate_owner(owner)?;
        validate_repo(name)?;
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Detect coordinates from the git repository in the current directory
    pub fn detect() -> Result<Self> {
        let git_repo = GitRepository::open_current_dir()?;
        let remote_url = git_repo.origin_url()?;
        let (owner, name) = parse_github_url(&remote_url)?;
        Self::new(&owner, &name)
    }

    /// Parse the `owner/repo` shorthand
    pub fn parse(value: &str) -> Result<Self> {
        let (owner, name) = value.trim().split_once('/').ok_or_else(|| {
            FigsyncError::InvalidInput(format!(
                "Expected 'owner/repo', got '{}'",
                value
            ))
        })?;
        Self::new(owner, name)
    }

    /// Get the full repository name (owner/name)
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Check a GitHub owner name
pub fn validate_owner(owner: &str) -> Result<()> {
    if OWNER_PATTERN.is_match(owner) {
        Ok(())
    } else {
        Err(FigsyncError::InvalidInput(format!(
            "'{}' is not a valid GitHub user or organization name",
            owner
        )))
    }
}

/// Check a GitHub repository name
pub fn validate_repo(repo: &str) -> Result<()> {
    if REPO_PATTERN.is_match(repo) && repo != "." && repo != ".." {
        Ok(())
    } else {
        Err(FigsyncError::InvalidInput(format!(
            "'{}' is not a valid GitHub repository name",
            repo
        )))
    }
}

/// Parse a GitHub URL to extract owner and repository name
///
/// Supports both HTTPS and SSH URL formats:
/// - `https://github.com/owner/repo.git`
/// - `https://github.com/owner/repo`
/// - `git@github.com:owner/repo.git`
/// - `ssh://git@github.com/owner/repo.git`
pub fn parse_github_url(url: &str) -> Result<(String, String)> {
    // SSH format: git@github.com:owner/repo.git
    if let Some(path) = url.strip_prefix("git@github.com:") {
        return parse_owner_repo_path(path.trim_end_matches(".git"));
    }

    // SSH URL format: ssh://git@github.com/owner/repo.git
    if let Some(path) = url.strip_prefix("ssh://git@github.com/") {
        return parse_owner_repo_path(path.trim_end_matches(".git"));
    }

    if let Ok(parsed) = Url::parse(url) {
        if parsed.host_str() == Some("github.com") {
            let path = parsed
                .path()
                .trim_start_matches('/')
                .trim_end_matches(".git");
            return parse_owner_repo_path(path);
        }
    }

    Err(FigsyncError::InvalidGitHubUrl(url.to_string()))
}

/// Parse owner/repo from a path string
fn parse_owner_repo_path(path: &str) -> Result<(String, String)> {
    let mut parts = path.split('/');
    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(FigsyncError::InvalidGitHubUrl(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_url() {
        let (owner, repo) = parse_github_url("https://github.com/owner/repo.git").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_ssh_url() {
        let (owner, repo) = parse_github_url("git@github.com:owner/repo").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_parse_ssh_protocol_url() {
        let (owner, repo) = parse_github_url("ssh://git@github.com/owner/repo.git").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
    }

    #[test]
    fn test_invalid_url() {
        assert!(parse_github_url("not-a-url").is_err());
        assert!(parse_github_url("https://gitlab.com/owner/repo").is_err());
    }

    #[test]
    fn test_parse_shorthand() {
        let coords = RepositoryCoordinates::parse("acme/design-tokens").unwrap();
        assert_eq!(coords.owner, "acme");
        assert_eq!(coords.name, "design-tokens");
        assert_eq!(coords.full_name(), "acme/design-tokens");

        assert!(RepositoryCoordinates::parse("acme").is_err());
        assert!(RepositoryCoordinates::parse("/tokens").is_err());
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_owner("my-org-123").is_ok());
        assert!(validate_owner("-leading").is_err());
        assert!(validate_owner("has space").is_err());

        assert!(validate_repo("design.tokens_v2").is_ok());
        assert!(validate_repo("..").is_err());
        assert!(validate_repo("a/b").is_err());
    }
}
