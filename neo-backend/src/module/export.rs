//! CSV export of flattened records

use anyhow::{Context, Result};
use neo_core::{ApproachRecord, NeoError};
use std::path::Path;

/// Serialize records with a header row. Missing numbers become empty fields.
pub fn records_to_csv(records: &[ApproachRecord]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());

    for record in records {
        writer.serialize(record).context("Failed to serialize record")?;
    }
    // serialize() only emits the header alongside the first row
    if records.is_empty() {
        writer
            .write_record(["id", "name", "close_approach_date", "miss_distance_km", "velocity_kph"])
            .context("Failed to write CSV header")?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// Write records to `path`, creating parent directories. Returns the row count.
pub async fn export_csv(records: &[ApproachRecord], path: &Path) -> Result<usize, NeoError> {
    write_csv(records, path)
        .await
        .map_err(|e| NeoError::Export(format!("{:#}", e)))?;
    tracing::info!("Exported {} records to {:?}", records.len(), path);
    Ok(records.len())
}

async fn write_csv(records: &[ApproachRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create export directory")?;
    }
    let content = records_to_csv(records)?;
    tokio::fs::write(path, content)
        .await
        .context(format!("Failed to write CSV file {:?}", path))
}
