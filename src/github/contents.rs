//! Repository contents operations
//!
//! The publish pipeline talks to the remote through `RemoteRepository`, which
//! covers the four calls it needs: default branch lookup, branch listing, and
//! reading and writing one file through the contents API.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::coordinator::LogicalConfig;
use crate::error::{FigsyncError, Result};
use crate::github::client::GitHubClient;
use crate::github::error_handler::{classify_github_error, status_of};

/// A file as it currently exists on the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Blob sha, the revision marker for updates
    pub sha: String,
    /// Decoded bytes, `None` when the API did not inline them (large files)
    pub content: Option<Vec<u8>>,
}

/// A create-or-update request for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    pub path: String,
    pub branch: String,
    pub content: String,
    pub message: String,
    /// Blob sha of the revision being replaced, `None` to create
    pub sha: Option<String>,
}

/// Commit produced by a file write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    pub sha: String,
    /// Link to the commit on the web
    pub html_url: String,
}

/// Remote repository operations used by publishing
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// Name of the repository's default branch
    async fn default_branch(&self) -> Result<String>;

    /// Branch names in the order the remote returns them
    async fn list_branches(&self) -> Result<Vec<String>>;

    /// Current file at `path` on `branch`, `None` if it does not exist
    async fn get_file(&self, path: &str, branch: &str) -> Result<Option<RemoteFile>>;

    /// Create or update a file in a single commit
    async fn put_file(&self, write: &FileWrite) -> Result<CommitRef>;
}

/// Opens a `RemoteRepository` for a configuration
pub trait RemoteConnector: Send + Sync {
    fn connect(&self, config: &LogicalConfig) -> Result<Arc<dyn RemoteRepository>>;
}

/// Connector producing octocrab-backed remotes
pub struct GitHubConnector {
    api_base_url: String,
}

impl GitHubConnector {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
        }
    }
}

impl RemoteConnector for GitHubConnector {
    fn connect(&self, config: &LogicalConfig) -> Result<Arc<dyn RemoteRepository>> {
        let client = GitHubClient::new(
            config.owner.clone(),
            config.repo.clone(),
            &config.secret,
            &self.api_base_url,
        )?;
        Ok(Arc::new(GitHubRemote::new(client)))
    }
}

// Minimal views of the REST responses; only the fields we read.

#[derive(Deserialize)]
struct RepoResponse {
    default_branch: Option<String>,
}

#[derive(Deserialize)]
struct BranchResponse {
    name: String,
}

#[derive(Deserialize)]
struct ContentResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Serialize)]
struct PutContentRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct PutContentResponse {
    commit: CommitResponse,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
    #[serde(default)]
    html_url: String,
}

#[derive(Serialize)]
struct RefQuery<'a> {
    #[serde(rename = "ref")]
    reference: &'a str,
}

#[derive(Serialize)]
struct PageQuery {
    per_page: u8,
}

/// `RemoteRepository` over the GitHub REST API
pub struct GitHubRemote {
    client: GitHubClient,
}

impl GitHubRemote {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteRepository for GitHubRemote {
    async fn default_branch(&self) -> Result<String> {
        // GitHub API: GET /repos/{owner}/{repo}
        let route = self.client.repo_route(&[]);
        let repo: RepoResponse = self
            .client
            .octocrab()
            .get(&route, None::<&()>)
            .await
            .map_err(|e| repository_error(e, &self.client))?;

        repo.default_branch.ok_or_else(|| {
            FigsyncError::GitHubApi(format!(
                "{}/{} has no default branch (is it empty?)",
                self.client.owner, self.client.repo
            ))
        })
    }

    async fn list_branches(&self) -> Result<Vec<String>> {
        // GitHub API: GET /repos/{owner}/{repo}/branches
        let route = self.client.repo_route(&["branches"]);
        let branches: Vec<BranchResponse> = self
            .client
            .octocrab()
            .get(&route, Some(&PageQuery { per_page: 100 }))
            .await
            .map_err(|e| repository_error(e, &self.client))?;

        Ok(branches.into_iter().map(|b| b.name).collect())
    }

    async fn get_file(&self, path: &str, branch: &str) -> Result<Option<RemoteFile>> {
        // GitHub API: GET /repos/{owner}/{repo}/contents/{path}?ref={branch}
        let route = self.client.repo_route(&["contents", path]);
        let response: std::result::Result<ContentResponse, _> = self
            .client
            .octocrab()
            .get(&route, Some(&RefQuery { reference: branch }))
            .await;

        let file = match response {
            Ok(file) => file,
            Err(e) if status_of(&e) == Some(404) => {
                debug!(path, branch, "remote file does not exist");
                return Ok(None);
            }
            Err(e) => return Err(classify_github_error(e)),
        };

        let content = match (file.encoding.as_deref(), file.content.as_deref()) {
            (Some("base64"), Some(encoded)) => Some(decode_content(encoded)?),
            _ => {
                warn!(path, "remote content not inlined, will overwrite without comparing");
                None
            }
        };

        Ok(Some(RemoteFile {
            sha: file.sha,
            content,
        }))
    }

    async fn put_file(&self, write: &FileWrite) -> Result<CommitRef> {
        // GitHub API: PUT /repos/{owner}/{repo}/contents/{path}
        let route = self.client.repo_route(&["contents", &write.path]);
        let body = PutContentRequest {
            message: &write.message,
            content: BASE64.encode(write.content.as_bytes()),
            branch: &write.branch,
            sha: write.sha.as_deref(),
        };

        let response: PutContentResponse = self
            .client
            .octocrab()
            .put(&route, Some(&body))
            .await?;

        Ok(CommitRef {
            sha: response.commit.sha,
            html_url: response.commit.html_url,
        })
    }
}

/// A 404 on a repository endpoint names the repository
fn repository_error(err: octocrab::Error, client: &GitHubClient) -> FigsyncError {
    if status_of(&err) == Some(404) {
        return FigsyncError::RepoAccessDenied {
            owner: client.owner.clone(),
            repo: client.repo.clone(),
        };
    }
    classify_github_error(err)
}

/// Decode the contents API's line-wrapped base64
pub fn decode_content(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact)
        .map_err(|e| FigsyncError::GitHubApi(format!("Invalid file content encoding: {}", e)))
}
