//! figsync - publish design variables to GitHub
//!
//! Available as the `fgs` command.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use figsync::cli::commands::{Cli, Commands};
use figsync::cli::{branch, config, export, publish, serve};
use figsync::error::{FigsyncError, Result};

#[tokio::main]
async fn main() {
    // Initialize logging; stdout belongs to command output and `serve`
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        handle_error(&e);
        std::process::exit(1);
    }
}

/// Print errors, with a hint for repository access problems
fn handle_error(e: &FigsyncError) {
    match e {
        FigsyncError::RepoAccessDenied { owner, repo } => {
            eprintln!();
            eprintln!("Cannot access '{}/{}'.", owner, repo);
            eprintln!();
            eprintln!("Check the owner and repo with: fgs config get");
            eprintln!("Fine-grained tokens need 'Contents: read and write' on this repository.");
        }
        _ => {
            eprintln!("Error: {}", e);
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let document = cli.document;

    match cli.command {
        Commands::Config(args) => config::handle_config(&document, args.command),
        Commands::Export(args) => export::handle_export(&document, args),
        Commands::Publish(args) => publish::handle_publish(&document, args).await,
        Commands::Branch(args) => branch::handle_branch(&document, args.command).await,
        Commands::Serve => serve::handle_serve(&document).await,
    }
}
