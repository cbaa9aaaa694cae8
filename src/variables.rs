//! Regional variable tables: one wide row of measurements per subject workbook.
//!
//! A reference workbook fixes the region layout of a modality. Every subject
//! workbook is checked against it sheet by sheet, and each sheet contributes
//! either its measurements, a missing segment, or a zero segment.

use std::path::Path;

use calamine::{DataType, Range};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ToolError};
use crate::io::excel_read::{self, Workbook};
use crate::io::tsv_write;
use crate::layout::{DatasetLayout, ModalitySpec, SheetSpec};
use crate::model::{CellValue, Table};

/// Separator joining the hemisphere, label and abbreviation of a region.
pub const REGION_KEY_SEPARATOR: &str = "-";

/// Workbook columns forming the region key.
const REGION_KEY_COLUMNS: std::ops::Range<usize> = 1..4;

/// Outcome of matching a subject workbook's file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectId {
    Identified(String),
    Unrecognized,
}

/// Outcome of reading one measurement sheet of a subject workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetAttempt {
    /// The sheet follows the reference layout; its flattened measurements.
    Matched(Vec<Option<f64>>),
    /// The workbook or sheet could not be read.
    Missing,
    /// The sheet was read but its regions differ from the reference.
    Mismatched,
}

/// Region layout every subject workbook of a modality must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLayout {
    modality: ModalitySpec,
    regions: Vec<String>,
}

impl ReferenceLayout {
    /// Builds the layout from an explicit region key sequence.
    pub fn new(modality: ModalitySpec, regions: Vec<String>) -> Self {
        Self { modality, regions }
    }

    /// Reads both measurement sheets of the reference workbook and requires
    /// that they agree on the region keys.
    pub fn establish(workbook: &mut Workbook, modality: ModalitySpec) -> Result<Self> {
        let [first, second] = modality.sheets;
        let first_keys = region_keys(&excel_read::read_sheet(workbook, first.name)?);
        let second_keys = region_keys(&excel_read::read_sheet(workbook, second.name)?);

        if first_keys.is_empty() {
            return Err(ToolError::LayoutMismatch {
                modality: modality.name.to_string(),
                detail: format!("sheet '{}' lists no regions", first.name),
            });
        }
        if first_keys != second_keys {
            let detail = match first_keys
                .iter()
                .zip(&second_keys)
                .position(|(lhs, rhs)| lhs != rhs)
            {
                Some(row) => format!(
                    "region {} is '{}' in '{}' but '{}' in '{}'",
                    row + 1,
                    first_keys[row],
                    first.name,
                    second_keys[row],
                    second.name
                ),
                None => format!(
                    "'{}' lists {} regions but '{}' lists {}",
                    first.name,
                    first_keys.len(),
                    second.name,
                    second_keys.len()
                ),
            };
            return Err(ToolError::LayoutMismatch {
                modality: modality.name.to_string(),
                detail,
            });
        }

        Ok(Self::new(modality, first_keys))
    }

    pub fn modality(&self) -> &ModalitySpec {
        &self.modality
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Number of values a sheet contributes to a subject row.
    pub fn sheet_width(&self, sheet: &SheetSpec) -> usize {
        self.regions.len() * sheet.measurements.len()
    }

    /// Output column names, without the leading identifier column.
    ///
    /// Columns run measurement by measurement, each covering every region in
    /// layout order.
    pub fn column_names(&self) -> Vec<String> {
        self.modality
            .sheets
            .iter()
            .flat_map(|sheet| sheet.measurements.iter())
            .flat_map(move |measurement| {
                self.regions
                    .iter()
                    .map(move |region| format!("{region}_{}", measurement.suffix))
            })
            .collect()
    }
}

/// Region key of every data row of a sheet, header row excluded.
///
/// Blank key cells are dropped before joining; rows whose key cells are all
/// blank after the last region are ignored.
pub fn region_keys(range: &Range<DataType>) -> Vec<String> {
    let mut keys: Vec<String> = excel_read::sheet_rows(range)
        .iter()
        .skip(1)
        .map(|row| region_key(row))
        .collect();
    while keys.last().is_some_and(|key| key.is_empty()) {
        keys.pop();
    }
    keys
}

fn region_key(row: &[CellValue]) -> String {
    REGION_KEY_COLUMNS
        .filter_map(|col| row.get(col))
        .filter(|cell| !cell.is_missing())
        .map(|cell| cell.to_string())
        .collect::<Vec<_>>()
        .join(REGION_KEY_SEPARATOR)
}

/// Maps a subject workbook file name onto a participant identifier.
///
/// The stem is split on `_`: `Brain_012_summary` yields `sub-012`, and the
/// four-part `Brain_ex012_i034_summary` yields `sub-034`.
pub fn subject_id_from_filename(path: &Path) -> SubjectId {
    let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
        return SubjectId::Unrecognized;
    };
    let tokens: Vec<&str> = stem.split('_').collect();
    match tokens.as_slice() {
        [_, subject, _] if !subject.is_empty() => SubjectId::Identified(format!("sub-{subject}")),
        [_, _, subject, _] => {
            let subject = subject.replace('i', "");
            if subject.is_empty() {
                SubjectId::Unrecognized
            } else {
                SubjectId::Identified(format!("sub-{subject}"))
            }
        }
        _ => SubjectId::Unrecognized,
    }
}

/// Reads one measurement sheet and checks it against the reference layout.
pub fn read_sheet_attempt(
    workbook: Option<&mut Workbook>,
    sheet: &SheetSpec,
    layout: &ReferenceLayout,
) -> SheetAttempt {
    let Some(workbook) = workbook else {
        return SheetAttempt::Missing;
    };
    match excel_read::read_sheet(workbook, sheet.name) {
        Ok(range) => flatten_sheet(&range, sheet, layout),
        Err(error) => {
            debug!(sheet = sheet.name, %error, "sheet unreadable");
            SheetAttempt::Missing
        }
    }
}

/// Flattens a sheet already read into memory.
pub fn flatten_sheet(
    range: &Range<DataType>,
    sheet: &SheetSpec,
    layout: &ReferenceLayout,
) -> SheetAttempt {
    let rows = excel_read::sheet_rows(range);
    let width = rows.first().map(Vec::len).unwrap_or(0);
    if sheet
        .measurements
        .iter()
        .any(|measurement| measurement.column >= width)
    {
        return SheetAttempt::Missing;
    }

    let keys = region_keys(range);
    if keys != layout.regions() {
        return SheetAttempt::Mismatched;
    }

    let data_rows = &rows[1..=keys.len()];
    let values = sheet
        .measurements
        .iter()
        .flat_map(move |measurement| {
            data_rows
                .iter()
                .map(move |row| row.get(measurement.column).and_then(CellValue::as_number))
        })
        .collect();
    SheetAttempt::Matched(values)
}

/// Turns a sheet attempt into exactly `width` values: missing sheets become
/// `None`, mismatched sheets become zeros.
pub fn substitute(attempt: SheetAttempt, width: usize) -> Vec<Option<f64>> {
    match attempt {
        SheetAttempt::Matched(values) => values,
        SheetAttempt::Missing => vec![None; width],
        SheetAttempt::Mismatched => vec![Some(0.0); width],
    }
}

/// Builds the variable table for the given subject workbooks.
pub fn build_variable_table(
    workbooks: &[impl AsRef<Path>],
    layout: &ReferenceLayout,
) -> Result<Table> {
    let width = layout.regions().len() * layout.modality().measurements_per_region();
    let mut columns = Vec::with_capacity(1 + width);
    columns.push("participant_id".to_string());
    columns.extend(layout.column_names());
    let mut table = Table::new(columns);

    let mut rows: Vec<(String, Vec<CellValue>)> = Vec::with_capacity(workbooks.len());
    for path in workbooks {
        let path = path.as_ref();
        let participant_id = match subject_id_from_filename(path) {
            SubjectId::Identified(id) => id,
            SubjectId::Unrecognized => {
                warn!(path = %path.display(), "unrecognized workbook name; subject skipped");
                continue;
            }
        };
        debug!(path = %path.display(), %participant_id, "loading subject workbook");

        let mut workbook = match excel_read::open(path) {
            Ok(workbook) => Some(workbook),
            Err(error) => {
                warn!(path = %path.display(), %error, "workbook unreadable");
                None
            }
        };

        let mut row = Vec::with_capacity(table.columns.len());
        row.push(CellValue::Text(participant_id.clone()));
        for sheet in &layout.modality().sheets {
            let attempt = read_sheet_attempt(workbook.as_mut(), sheet, layout);
            match &attempt {
                SheetAttempt::Matched(_) => {}
                SheetAttempt::Missing => {
                    warn!(%participant_id, sheet = sheet.name, "modality missing");
                }
                SheetAttempt::Mismatched => {
                    warn!(
                        %participant_id,
                        sheet = sheet.name,
                        "regions differ from reference layout"
                    );
                }
            }
            let values = substitute(attempt, layout.sheet_width(sheet));
            row.extend(values.into_iter().map(CellValue::from_measurement));
        }
        rows.push((participant_id, row));
    }

    rows.sort_by(|lhs, rhs| lhs.0.cmp(&rhs.0));
    for (_, row) in rows {
        table.push_row(row)?;
    }
    Ok(table)
}

/// Converts every subject workbook of a modality into its variable table.
/// Returns the number of subjects written.
#[instrument(level = "info", skip_all, fields(modality = modality.name))]
pub fn build_variables(layout: &DatasetLayout, modality: ModalitySpec) -> Result<usize> {
    let reference_path = layout.reference_workbook(&modality);
    let mut reference = excel_read::open(&reference_path)?;
    let reference = ReferenceLayout::establish(&mut reference, modality)?;
    info!(
        regions = reference.regions().len(),
        columns = reference.regions().len() * modality.measurements_per_region(),
        "reference layout established"
    );

    let workbooks = excel_read::list_workbooks(&layout.variables_dir(&modality))?;
    info!(workbooks = workbooks.len(), "importing {} data", modality.name);

    let table = build_variable_table(&workbooks, &reference)?;
    tsv_write::write_table(&layout.variables_table(&modality), &table)?;

    info!(subjects = table.rows.len(), "variable table written");
    Ok(table.rows.len())
}
