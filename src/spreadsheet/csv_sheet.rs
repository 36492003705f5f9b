//! CSV reading and writing for the section sheet layout

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use super::{SheetError, SheetRows};

/// Write rows to CSV; rows may differ in length
pub fn write_csv(rows: &[Vec<String>], path: &Path) -> Result<(), SheetError> {
    let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;

    for row in rows {
        writer.write_record(row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Read every CSV record as a row, the header included
pub fn read_csv(path: &Path) -> Result<SheetRows, SheetError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|value| {
                    let value = value.trim();
                    (!value.is_empty()).then(|| value.to_string())
                })
                .collect(),
        );
    }

    Ok(rows)
}
