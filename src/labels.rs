//! Atlas label lookup tables.

use tracing::{error, info, instrument};

use crate::error::{Result, ToolError};
use crate::io::{excel_read, tsv_write};
use crate::layout::DatasetLayout;
use crate::model::{CellValue, Table};

/// Atlas whose label table is written from [`LABEL006_NAMES`].
pub const LABEL006: &str = "Label006";

/// Atlases whose label tables are copied from their classification workbooks.
pub const CLASSIFIED_ATLASES: [&str; 2] = ["Label052", "Label111"];

/// Tissue classes of the six-label segmentation, indexed from 1.
pub const LABEL006_NAMES: [&str; 6] = [
    "CSF",
    "Gray Matter",
    "White Matter",
    "Ventricles",
    "Brainstem",
    "Cerebellum",
];

pub const LABEL006_COLUMNS: [&str; 3] = [
    "Number",
    "Region Name of Label006.nii.gz",
    "Region Name of Brain/MINDS Marmoset Reference Atlas (BMA)",
];

/// The six-label table. The atlas region name column is left blank.
pub fn label006_table() -> Result<Table> {
    let mut table = Table::new(LABEL006_COLUMNS.iter().map(|c| c.to_string()).collect());
    for (index, name) in LABEL006_NAMES.iter().enumerate() {
        table.push_row(vec![
            CellValue::Number((index + 1) as f64),
            CellValue::from(*name),
            CellValue::Missing,
        ])?;
    }
    Ok(table)
}

/// Reads the first worksheet of a classification workbook as-is.
pub fn classification_table(path: &std::path::Path) -> Result<Table> {
    let mut workbook = excel_read::open(path)?;
    let range = excel_read::read_first_sheet(&mut workbook)?;
    excel_read::sheet_table(&range)
}

/// Writes every label table. A failing classification workbook does not
/// stop the others; the first failure is returned once all are attempted.
#[instrument(level = "info", skip_all, fields(root = %layout.root().display()))]
pub fn build_labels(layout: &DatasetLayout) -> Result<()> {
    info!("creating parcellation label files");

    tsv_write::write_table(&layout.label_table(LABEL006), &label006_table()?)?;

    let mut first_failure: Option<ToolError> = None;
    for atlas in CLASSIFIED_ATLASES {
        let outcome = classification_table(&layout.label_source(atlas)).and_then(|table| {
            tsv_write::write_table(&layout.label_table(atlas), &table)?;
            Ok(table.rows.len())
        });
        match outcome {
            Ok(labels) => info!(atlas, labels, "label table written"),
            Err(failure) => {
                error!(atlas, error = %failure, "label table not written");
                first_failure.get_or_insert(failure);
            }
        }
    }

    match first_failure {
        Some(failure) => Err(failure),
        None => Ok(()),
    }
}
