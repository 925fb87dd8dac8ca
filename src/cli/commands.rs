//! CLI command definitions using clap
//!
//! Defines the command structure for the `fgs` CLI tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::coordinator::ConfigField;

/// figsync - publish design variables to GitHub
///
/// Exports the variables of a design document and keeps a file in a GitHub
/// repository in sync with them.
#[derive(Parser, Debug)]
#[command(name = "fgs", version, about, long_about = None)]
pub struct Cli {
    /// Host document (variables, collections and plugin data)
    #[arg(
        long,
        short = 'd',
        global = true,
        env = "FIGSYNC_DOCUMENT",
        default_value = "figsync.document.json"
    )]
    pub document: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the connection profile and token
    Config(ConfigArgs),

    /// Print the variable snapshot
    Export(ExportArgs),

    /// Publish the variable snapshot to GitHub
    Publish(PublishArgs),

    /// Inspect remote branches
    Branch(BranchArgs),

    /// Serve the message router over stdin/stdout (JSON lines)
    Serve,
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set {
        /// Configuration key
        key: ConfigKey,

        /// Configuration value (prompted for when setting the token)
        value: Option<String>,
    },

    /// Show the configuration, or a single value
    Get {
        /// Configuration key
        key: Option<ConfigKey>,
    },

    /// Clear a configuration value
    Unset {
        /// Configuration key
        key: ConfigKey,
    },

    /// Fill owner and repo from the current git repository's origin
    Detect,
}

/// Available configuration keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    /// Repository owner
    Owner,
    /// Repository name
    Repo,
    /// Owner and repository as `owner/repo`
    #[value(name = "owner-repo")]
    OwnerRepo,
    /// File path inside the repository
    Path,
    /// Target branch (empty for the default branch)
    Branch,
    /// GitHub access token
    Token,
}

impl ConfigKey {
    /// Stored fields behind this key
    pub fn fields(&self) -> &'static [ConfigField] {
        match self {
            ConfigKey::Owner => &[ConfigField::Owner],
            ConfigKey::Repo => &[ConfigField::Repo],
            ConfigKey::OwnerRepo => &[ConfigField::Owner, ConfigField::Repo],
            ConfigKey::Path => &[ConfigField::Path],
            ConfigKey::Branch => &[ConfigField::Branch],
            ConfigKey::Token => &[ConfigField::Secret],
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export / Publish Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Export options
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Publish options
#[derive(Parser, Debug)]
pub struct PublishArgs {
    /// Print the publish report as JSON
    #[arg(long)]
    pub json: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Branch Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Branch commands
#[derive(Parser, Debug)]
pub struct BranchArgs {
    #[command(subcommand)]
    pub command: BranchCommand,
}

#[derive(Subcommand, Debug)]
pub enum BranchCommand {
    /// List remote branches, default first
    List,
}
