use anyhow::{Context, Result};
use csv::{StringRecord, WriterBuilder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::domain::Record;

/// Writes the header row followed by each record's raw row, comma-separated.
pub fn write_csv<W: Write>(writer: W, headers: &StringRecord, records: &[&Record]) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().delimiter(b',').from_writer(writer);

    csv_writer
        .write_record(headers)
        .context("Failed to write export header")?;
    for record in records {
        csv_writer
            .write_record(record.raw())
            .context("Failed to write export row")?;
    }
    csv_writer.flush().context("Failed to flush export")?;
    Ok(())
}

pub fn export_records(output: &Path, headers: &StringRecord, records: &[&Record]) -> Result<()> {
    let start_time = Instant::now();
    info!(action = "start", component = "export", destination = ?output, record_count = records.len(), "Exporting filtered records");

    let file = File::create(output)
        .with_context(|| format!("Failed to create export file {:?}", output))?;
    write_csv(BufWriter::new(file), headers, records)?;

    info!(
        action = "complete",
        component = "export",
        duration_ms = start_time.elapsed().as_millis(),
        "Export completed"
    );
    Ok(())
}
