use std::fs;
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::Result;
use crate::model::Table;

/// Writes the table as tab-separated values with a header row.
///
/// Missing cells are written as [`crate::model::NULL_TOKEN`]. Parent
/// directories are created when absent.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(Terminator::Any(b'\n'))
        .quote_style(QuoteStyle::Necessary)
        .from_path(path)?;

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }

    writer.flush()?;
    Ok(())
}
