//! Export CLI command handler

use std::fs;
use std::path::Path;

use crate::cli::commands::ExportArgs;
use crate::core::document::DocumentFile;
use crate::core::snapshot::SnapshotExporter;
use crate::error::Result;

/// Handle the export command
pub fn handle_export(document: &Path, args: ExportArgs) -> Result<()> {
    let document = DocumentFile::open(document);
    let json = SnapshotExporter::export_json(&document)?;

    match args.output {
        Some(output) => {
            fs::write(&output, format!("{}\n", json))?;
            println!("✓ Snapshot written to {}", output.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
