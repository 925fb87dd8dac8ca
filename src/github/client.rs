//! GitHub API client wrapper using octocrab

use octocrab::Octocrab;
use secrecy::ExposeSecret;

use crate::core::coordinator::Secret;
use crate::error::Result;

/// GitHub API client wrapper
///
/// Bound to a single repository and authenticated with the profile's token.
pub struct GitHubClient {
    /// The octocrab instance
    inner: Octocrab,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl GitHubClient {
    /// Create a new GitHub client for the given repository
    ///
    /// `api_base_url` is `https://api.github.com` unless talking to
    /// GitHub Enterprise or a test server.
    pub fn new(owner: String, repo: String, token: &Secret, api_base_url: &str) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(token.0.expose_secret().to_string())
            .base_uri(api_base_url)?
            .build()?;

        Ok(Self {
            inner: octocrab,
            owner,
            repo,
        })
    }

    /// Get the inner octocrab instance
    pub fn octocrab(&self) -> &Octocrab {
        &self.inner
    }

    /// Route of a repository-level endpoint, e.g. `/repos/o/r/branches`
    pub fn repo_route(&self, segments: &[&str]) -> String {
        let mut route = format!(
            "/repos/{}/{}",
            encode_segment(&self.owner),
            encode_segment(&self.repo)
        );
        for segment in segments {
            for part in segment.split('/').filter(|p| !p.is_empty()) {
                route.push('/');
                route.push_str(&encode_segment(part));
            }
        }
        route
    }
}

/// Percent-encode a single path segment
fn encode_segment(segment: &str) -> String {
    let Ok(mut url) = url::Url::parse("https://example.invalid/") else {
        return segment.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(segment);
    }
    url.path().trim_start_matches('/').to_string()
}
