//! JSON export and import of product records

use crate::output::OutputResult;
use crate::record::ProductRecord;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Writes `records` as a pretty-printed UTF-8 JSON array
pub fn write_json_export(path: &Path, records: &[ProductRecord]) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!("Exported {} products to {}", records.len(), path.display());
    Ok(())
}

/// Reads an export written by [`write_json_export`]
pub fn read_json_export(path: &Path) -> OutputResult<Vec<ProductRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let records: Vec<ProductRecord> = serde_json::from_reader(reader)?;

    tracing::info!("Read {} products from {}", records.len(), path.display());
    Ok(records)
}
