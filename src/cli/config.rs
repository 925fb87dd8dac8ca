//! Configuration CLI command handlers

use std::io::{self, Write};
use std::path::Path;

use crate::cli::commands::{ConfigCommand, ConfigKey};
use crate::core::coordinator::{ConfigCoordinator, LogicalConfig, Secret};
use crate::core::credentials::CredentialVault;
use crate::core::repository::{validate_owner, validate_repo, RepositoryCoordinates};
use crate::error::{FigsyncError, Result};

/// Handle configuration commands
pub fn handle_config(document: &Path, command: ConfigCommand) -> Result<()> {
    let coordinator = super::coordinator(document);

    match command {
        ConfigCommand::Set { key, value } => handle_set(&coordinator, key, value),
        ConfigCommand::Get { key } => handle_get(&coordinator, key),
        ConfigCommand::Unset { key } => handle_unset(&coordinator, key),
        ConfigCommand::Detect => handle_detect(&coordinator),
    }
}

/// Build the partial config a `set` writes
///
/// Only the named field is non-empty, so saving it leaves the rest alone.
pub fn partial_config(key: ConfigKey, value: &str) -> Result<LogicalConfig> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FigsyncError::InvalidInput(format!(
            "Empty value for '{}'. Use 'fgs config unset' to clear it.",
            key_name(key)
        )));
    }

    let mut config = LogicalConfig::default();
    match key {
        ConfigKey::Owner => {
            validate_owner(value)?;
            config.owner = value.to_string();
        }
        ConfigKey::Repo => {
            validate_repo(value)?;
            config.repo = value.to_string();
        }
        ConfigKey::OwnerRepo => {
            let coords = RepositoryCoordinates::parse(value)?;
            config.owner = coords.owner;
            config.repo = coords.name;
        }
        ConfigKey::Path => config.path = value.trim_start_matches('/').to_string(),
        ConfigKey::Branch => config.branch = value.to_string(),
        ConfigKey::Token => config.secret = Secret::new(value),
    }
    Ok(config)
}

/// Handle setting a configuration value
fn handle_set(
    coordinator: &ConfigCoordinator,
    key: ConfigKey,
    value: Option<String>,
) -> Result<()> {
    let value = match value {
        Some(value) => value,
        None if key == ConfigKey::Token => prompt_token()?,
        None => {
            return Err(FigsyncError::InvalidInput(format!(
                "Missing value for '{}'",
                key_name(key)
            )))
        }
    };

    coordinator.save(&partial_config(key, &value)?)?;

    if key == ConfigKey::Token {
        println!("✓ Access token has been stored securely.");
    } else {
        println!("✓ {} set to: {}", key_name(key), value.trim());
    }
    Ok(())
}

/// Handle getting one or all configuration values
fn handle_get(coordinator: &ConfigCoordinator, key: Option<ConfigKey>) -> Result<()> {
    let config = coordinator.load();

    match key {
        Some(key) => println!("{}", display_value(&config, key)),
        None => {
            for key in [
                ConfigKey::Owner,
                ConfigKey::Repo,
                ConfigKey::Path,
                ConfigKey::Branch,
                ConfigKey::Token,
            ] {
                let label = format!("{}:", key_name(key));
                println!("{:<7} {}", label, display_value(&config, key));
            }
            if let Some(id) = coordinator.profile_id() {
                println!("profile {}", id);
            }
        }
    }
    Ok(())
}

/// Handle clearing a configuration value
fn handle_unset(coordinator: &ConfigCoordinator, key: ConfigKey) -> Result<()> {
    for field in key.fields() {
        coordinator.clear(*field)?;
    }
    println!("✓ {} cleared", key_name(key));
    Ok(())
}

/// Handle detecting owner/repo from git
fn handle_detect(coordinator: &ConfigCoordinator) -> Result<()> {
    let coords = RepositoryCoordinates::detect()?;
    let config = LogicalConfig {
        owner: coords.owner.clone(),
        repo: coords.name.clone(),
        ..LogicalConfig::default()
    };
    coordinator.save(&config)?;
    println!("✓ Repository set to {}", coords.full_name());
    Ok(())
}

fn display_value(config: &LogicalConfig, key: ConfigKey) -> String {
    let value = match key {
        ConfigKey::Owner => config.owner.clone(),
        ConfigKey::Repo => config.repo.clone(),
        ConfigKey::OwnerRepo => config.full_name(),
        ConfigKey::Path => config.path.clone(),
        ConfigKey::Branch => config.branch.clone(),
        ConfigKey::Token if config.secret.is_empty() => String::new(),
        ConfigKey::Token => CredentialVault::mask_token(&config.secret.0),
    };

    if value.is_empty() {
        match key {
            ConfigKey::Branch => "(repository default)".to_string(),
            ConfigKey::Path => "(default)".to_string(),
            _ => "Not configured".to_string(),
        }
    } else {
        value
    }
}

fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::Owner => "owner",
        ConfigKey::Repo => "repo",
        ConfigKey::OwnerRepo => "owner-repo",
        ConfigKey::Path => "path",
        ConfigKey::Branch => "branch",
        ConfigKey::Token => "token",
    }
}

fn prompt_token() -> Result<String> {
    println!("To create a token:");
    println!("  1. Go to: https://github.com/settings/tokens/new");
    println!("  2. Select the 'repo' scope (or contents: write for fine-grained tokens)");
    println!();
    print!("Paste your token here: ");
    io::stdout().flush()?;

    let mut token = String::new();
    io::stdin().read_line(&mut token)?;
    let token = token.trim().to_string();

    if token.is_empty() {
        return Err(FigsyncError::InvalidInput("No token provided".to_string()));
    }
    Ok(token)
}
