//! Branch operations

use crate::error::Result;
use crate::github::contents::RemoteRepository;

/// Information about a remote branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    /// Branch name
    pub name: String,
    /// Whether this is the default branch
    pub is_default: bool,
}

/// Branch operations handler
pub struct BranchHandler<'a> {
    remote: &'a dyn RemoteRepository,
}

impl<'a> BranchHandler<'a> {
    /// Create a new handler
    pub fn new(remote: &'a dyn RemoteRepository) -> Self {
        Self { remote }
    }

    /// List remote branches, default branch first
    pub async fn list(&self) -> Result<Vec<BranchInfo>> {
        let default_branch = self.remote.default_branch().await?;
        let branches = self.remote.list_branches().await?;

        let mut infos = vec![BranchInfo {
            name: default_branch.clone(),
            is_default: true,
        }];
        infos.extend(
            branches
                .into_iter()
                .filter(|name| *name != default_branch)
                .map(|name| BranchInfo {
                    name,
                    is_default: false,
                }),
        );

        Ok(infos)
    }

    /// Names only, default branch first
    pub async fn names(&self) -> Result<Vec<String>> {
        Ok(self.list().await?.into_iter().map(|b| b.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::contents::MockRemoteRepository;

    #[tokio::test]
    async fn test_default_branch_comes_first() {
        let mut remote = MockRemoteRepository::new();
        remote
            .expect_default_branch()
            .returning(|| Ok("main".to_string()));
        remote.expect_list_branches().returning(|| {
            Ok(vec![
                "develop".to_string(),
                "main".to_string(),
                "feature/tokens".to_string(),
            ])
        });

        let handler = BranchHandler::new(&remote);
        let names = handler.names().await.unwrap();
        assert_eq!(names, vec!["main", "develop", "feature/tokens"]);

        let list = handler.list().await.unwrap();
        assert!(list[0].is_default);
        assert!(!list[1].is_default);
    }
}
