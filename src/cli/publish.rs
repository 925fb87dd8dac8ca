//! Publish CLI command handler

use std::path::Path;
use std::sync::Arc;

use crate::cli::commands::PublishArgs;
use crate::core::config::Settings;
use crate::core::snapshot::SnapshotExporter;
use crate::error::{FigsyncError, Result};
use crate::github::contents::GitHubConnector;
use crate::github::publish::{PublishReport, Publisher};

/// Handle the publish command
///
/// A failed publish is returned as an error so the process exits non-zero.
pub async fn handle_publish(document: &Path, args: PublishArgs) -> Result<()> {
    let settings = Settings::load()?;
    let document = super::open_document(document);
    let config = super::coordinator_for(document.clone()).load();
    let payload = SnapshotExporter::export_json(document.as_ref())?;

    let publisher = Publisher::new(
        Arc::new(GitHubConnector::new(settings.api_base_url.clone())),
        &settings,
    );

    if !args.json {
        println!("Sending to GitHub...");
    }
    let report = publisher.publish(&config, &payload).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_success() {
        print_report(&report);
    }

    match report.error() {
        Some(e) => Err(FigsyncError::Publish(e.clone())),
        None => Ok(()),
    }
}

fn print_report(report: &PublishReport) {
    let target = match &report.branch {
        Some(branch) => format!("{}@{}", report.path, branch),
        None => report.path.clone(),
    };
    println!("✓ {} ({})", report.message(), target);
}
