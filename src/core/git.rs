//! Local git repository lookup
//!
//! Only used to prefill owner/repo from the `origin` remote of the
//! repository the user is working in.

use std::path::Path;

use git2::Repository;

use crate::error::{FigsyncError, Result};

/// Wrapper for local git repository operations
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Open the git repository in the current directory
    pub fn open_current_dir() -> Result<Self> {
        Self::discover(".")
    }

    /// Discover a git repository from the given path
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|_| FigsyncError::NotGitRepository)?;
        Ok(Self { repo })
    }

    /// Get the remote URL for a given remote name
    pub fn remote_url(&self, remote_name: &str) -> Result<String> {
        let remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|_| FigsyncError::NoGitHubRemote)?;
        remote
            .url()
            .map(|s| s.to_string())
            .ok_or(FigsyncError::NoGitHubRemote)
    }

    /// Get the origin remote URL
    pub fn origin_url(&self) -> Result<String> {
        self.remote_url("origin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_origin_url_from_fresh_repository() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        repo.remote("origin", "git@github.com:acme/design-tokens.git")
            .unwrap();

        let git = GitRepository::discover(dir.path()).unwrap();
        assert_eq!(
            git.origin_url().unwrap(),
            "git@github.com:acme/design-tokens.git"
        );
    }

    #[test]
    fn test_missing_origin() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();

        let git = GitRepository::discover(dir.path()).unwrap();
        assert!(matches!(
            git.origin_url(),
            Err(FigsyncError::NoGitHubRemote)
        ));
    }
}
