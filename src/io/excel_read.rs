use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::model::{CellValue, Table};

/// Workbook handle produced by [`open`].
pub type Workbook = Xlsx<BufReader<File>>;

/// Opens an `.xlsx` workbook, reporting absent files as [`ToolError::MissingInput`].
pub fn open(path: &Path) -> Result<Workbook> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    let workbook: Workbook = open_workbook(path)?;
    Ok(workbook)
}

/// Reads the named worksheet.
pub fn read_sheet(workbook: &mut Workbook, name: &str) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

/// Reads the first worksheet of the workbook, whatever its name.
pub fn read_first_sheet(workbook: &mut Workbook) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ToolError::InvalidWorkbook("workbook has no worksheets".into()))?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

/// Converts a sheet into rows of cells addressed by absolute column index.
///
/// calamine trims leading empty columns from a range; they are restored as
/// [`CellValue::Missing`] so that column `n` always means spreadsheet column `n`.
pub fn sheet_rows(range: &Range<DataType>) -> Vec<Vec<CellValue>> {
    let column_offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    range
        .rows()
        .map(|row| {
            let mut cells = Vec::with_capacity(column_offset + row.len());
            cells.resize(column_offset, CellValue::Missing);
            cells.extend(row.iter().map(cell_value));
            cells
        })
        .collect()
}

/// Reads a whole sheet as a table: the first row is the header, every later
/// row is data. Short rows are padded with missing cells.
pub fn sheet_table(range: &Range<DataType>) -> Result<Table> {
    let mut rows = sheet_rows(range).into_iter();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };

    let columns: Vec<String> = header
        .into_iter()
        .enumerate()
        .map(|(idx, cell)| match cell {
            CellValue::Missing => format!("Unnamed: {idx}"),
            other => other.to_string(),
        })
        .collect();

    let width = columns.len();
    let mut table = Table::new(columns);
    for mut row in rows {
        row.resize(width, CellValue::Missing);
        table.push_row(row)?;
    }
    Ok(table)
}

/// Converts a calamine cell into the crate's cell model.
pub fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::Empty => CellValue::Missing,
        DataType::String(value) if value.trim().is_empty() => CellValue::Missing,
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Flag(*value),
        DataType::Error(_) => CellValue::Missing,
        other => CellValue::Text(other.to_string()),
    }
}

/// Renders a cell as text; blanks become the empty string.
pub fn cell_text(cell: Option<&CellValue>) -> String {
    match cell {
        Some(CellValue::Missing) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Lists the `.xlsx` workbooks in a directory, sorted by path.
///
/// Office lock files (`~$...`) are skipped.
pub fn list_workbooks(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ToolError::MissingInput(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_xlsx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
        let is_lock_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("~$"));
        if is_xlsx && !is_lock_file {
            paths.push(path);
        } else {
            debug!(path = %path.display(), "ignoring non-workbook entry");
        }
    }

    paths.sort();
    Ok(paths)
}
