//! Publish pipeline
//!
//! Makes the remote file equal to the exported snapshot:
//! 1. check the configuration is complete (no network before that)
//! 2. resolve the branch (empty means the repository default)
//! 3. fetch the current file, if any
//! 4. stop with `Unchanged` when the bytes already match
//! 5. otherwise create or update it in one commit, passing the current blob
//!    sha so a concurrent edit makes the write fail instead of being lost
//!
//! `publish` always returns a report. Failures are part of the report and
//! never escape as errors or panics.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::core::config::Settings;
use crate::core::coordinator::LogicalConfig;
use crate::error::FigsyncError;
use crate::github::contents::{FileWrite, RemoteConnector, RemoteRepository};

/// Why a publish did not go through
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// Required configuration missing; nothing was sent
    #[error("Missing configuration: {}. Fill in the connection settings and save.", .0.join(", "))]
    ConfigIncomplete(Vec<&'static str>),

    /// The token was rejected; retrying will not help
    #[error("GitHub rejected the access token: {0}")]
    AuthRejected(String),

    /// Network failure, missing repository, timeout; safe to retry
    #[error("Could not reach the repository: {0}")]
    RemoteUnreachable(String),

    /// The file changed between read and write
    #[error("The remote file changed while publishing: {0}")]
    RemoteConflict(String),
}

impl PublishError {
    /// Machine-readable kind for the UI
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::ConfigIncomplete(_) => "config_incomplete",
            PublishError::AuthRejected(_) => "auth_rejected",
            PublishError::RemoteUnreachable(_) => "remote_unreachable",
            PublishError::RemoteConflict(_) => "remote_conflict",
        }
    }

    /// Whether running the same publish again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PublishError::RemoteUnreachable(_) | PublishError::RemoteConflict(_)
        )
    }
}

impl From<FigsyncError> for PublishError {
    fn from(err: FigsyncError) -> Self {
        match err {
            FigsyncError::AuthRejected(msg) => PublishError::AuthRejected(msg),
            FigsyncError::Conflict(msg) => PublishError::RemoteConflict(msg),
            other => PublishError::RemoteUnreachable(other.to_string()),
        }
    }
}

/// What a publish did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The file did not exist and was created
    Created { commit_url: String },
    /// The file existed with different content and was replaced
    Updated { commit_url: String },
    /// The file already held this content; no commit was made
    Unchanged,
    /// Nothing was written
    Failed(PublishError),
}

/// Terminal result of one `publish` call
#[derive(Debug, Clone, Serialize)]
#[serde(into = "PublishSummary")]
pub struct PublishReport {
    pub outcome: PublishOutcome,
    /// Branch written to, when it was resolved
    pub branch: Option<String>,
    /// Path written to
    pub path: String,
    pub published_at: DateTime<Utc>,
}

impl PublishReport {
    /// `created`, `updated`, `unchanged` or `failed`
    pub fn status(&self) -> &'static str {
        match self.outcome {
            PublishOutcome::Created { .. } => "created",
            PublishOutcome::Updated { .. } => "updated",
            PublishOutcome::Unchanged => "unchanged",
            PublishOutcome::Failed(_) => "failed",
        }
    }

    /// Commit link for user feedback
    pub fn locator(&self) -> Option<&str> {
        match &self.outcome {
            PublishOutcome::Created { commit_url } | PublishOutcome::Updated { commit_url } => {
                Some(commit_url.as_str())
            }
            _ => None,
        }
    }

    /// The error, if the publish failed
    pub fn error(&self) -> Option<&PublishError> {
        match &self.outcome {
            PublishOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error().is_none()
    }

    /// User-facing status line
    pub fn message(&self) -> String {
        match &self.outcome {
            PublishOutcome::Created { commit_url } => format!("Created via {}", commit_url),
            PublishOutcome::Updated { commit_url } => format!("Updated via {}", commit_url),
            PublishOutcome::Unchanged => "Already up to date.".to_string(),
            PublishOutcome::Failed(e) => e.to_string(),
        }
    }
}

/// Wire shape of a report
#[derive(Serialize)]
struct PublishSummary {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    locator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    message: String,
    branch: Option<String>,
    path: String,
    published_at: DateTime<Utc>,
}

impl From<PublishReport> for PublishSummary {
    fn from(report: PublishReport) -> Self {
        Self {
            status: report.status(),
            locator: report.locator().map(str::to_string),
            error: report.error().map(PublishError::kind),
            message: report.message(),
            branch: report.branch,
            path: report.path,
            published_at: report.published_at,
        }
    }
}

/// Runs publishes against remotes produced by a connector
pub struct Publisher {
    connector: Arc<dyn RemoteConnector>,
    commit_message: String,
    default_path: String,
    timeout: Duration,
    conflict_retries: u32,
}

impl Publisher {
    pub fn new(connector: Arc<dyn RemoteConnector>, settings: &Settings) -> Self {
        Self {
            connector,
            commit_message: settings.commit_message.clone(),
            default_path: settings.default_path.clone(),
            timeout: settings.timeout(),
            conflict_retries: settings.conflict_retries,
        }
    }

    /// Target path for a configuration: its own, or the default
    pub fn target_path(&self, config: &LogicalConfig) -> String {
        let path = config.path.trim().trim_start_matches('/');
        if path.is_empty() {
            self.default_path.clone()
        } else {
            path.to_string()
        }
    }

    /// Make the remote file hold `payload`
    pub async fn publish(&self, config: &LogicalConfig, payload: &str) -> PublishReport {
        let path = self.target_path(config);
        let finish = |outcome, branch| PublishReport {
            outcome,
            branch,
            path: path.clone(),
            published_at: Utc::now(),
        };

        let missing = config.missing_required();
        if !missing.is_empty() {
            return finish(
                PublishOutcome::Failed(PublishError::ConfigIncomplete(missing)),
                None,
            );
        }

        let remote = match self.connector.connect(config) {
            Ok(remote) => remote,
            Err(e) => return finish(PublishOutcome::Failed(e.into()), None),
        };

        let mut retries = 0;
        let result = loop {
            let attempt = timeout(
                self.timeout,
                self.attempt(remote.as_ref(), config, &path, payload),
            )
            .await
            .unwrap_or_else(|_| {
                Err(PublishError::RemoteUnreachable(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                )))
            });

            match attempt {
                Err(PublishError::RemoteConflict(reason)) if retries < self.conflict_retries => {
                    retries += 1;
                    warn!(%reason, retries, "remote changed during publish, retrying");
                }
                other => break other,
            }
        };

        match result {
            Ok((branch, outcome)) => {
                let report = finish(outcome, Some(branch));
                info!(
                    status = report.status(),
                    branch = report.branch.as_deref().unwrap_or_default(),
                    path = %report.path,
                    "publish finished"
                );
                report
            }
            Err(e) => {
                warn!(kind = e.kind(), "publish failed: {}", e);
                let branch = (!config.branch.is_empty()).then(|| config.branch.clone());
                finish(PublishOutcome::Failed(e), branch)
            }
        }
    }

    /// One pass of steps 2 to 5
    async fn attempt(
        &self,
        remote: &dyn RemoteRepository,
        config: &LogicalConfig,
        path: &str,
        payload: &str,
    ) -> Result<(String, PublishOutcome), PublishError> {
        let branch = match config.branch.trim() {
            "" => remote.default_branch().await?,
            branch => branch.to_string(),
        };

        let existing = remote.get_file(path, &branch).await?;

        if let Some(file) = &existing {
            if file.content.as_deref() == Some(payload.as_bytes()) {
                return Ok((branch, PublishOutcome::Unchanged));
            }
        }

        let write = FileWrite {
            path: path.to_string(),
            branch: branch.clone(),
            content: payload.to_string(),
            message: self.commit_message.clone(),
            sha: existing.as_ref().map(|f| f.sha.clone()),
        };
        let commit = remote.put_file(&write).await?;

        let outcome = if existing.is_some() {
            PublishOutcome::Updated {
                commit_url: commit.html_url,
            }
        } else {
            PublishOutcome::Created {
                commit_url: commit.html_url,
            }
        };

        Ok((branch, outcome))
    }
}
