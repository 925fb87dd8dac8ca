//! Branch CLI command handlers

use std::path::Path;

use crate::cli::commands::BranchCommand;
use crate::core::config::Settings;
use crate::error::{FigsyncError, Result};
use crate::github::branch::BranchHandler;
use crate::github::contents::{GitHubConnector, RemoteConnector};

/// Handle branch commands
pub async fn handle_branch(document: &Path, command: BranchCommand) -> Result<()> {
    match command {
        BranchCommand::List => handle_list(document).await,
    }
}

async fn handle_list(document: &Path) -> Result<()> {
    let settings = Settings::load()?;
    let config = super::coordinator(document).load();

    let missing = config.missing_required();
    if !missing.is_empty() {
        return Err(FigsyncError::Config(format!(
            "Missing {}. Set them with 'fgs config set'.",
            missing.join(", ")
        )));
    }

    let remote = GitHubConnector::new(settings.api_base_url.clone()).connect(&config)?;
    let branches = BranchHandler::new(remote.as_ref()).list().await?;

    if branches.is_empty() {
        println!("No remote branches found.");
        return Ok(());
    }

    println!("Remote branches for {}:\n", config.full_name());

    for branch in branches {
        let default_marker = if branch.is_default { " (default)" } else { "" };
        let target_marker = if branch.name == config.branch { " ←" } else { "" };
        println!("  {}{}{}", branch.name, default_marker, target_marker);
    }

    Ok(())
}
