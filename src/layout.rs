//! Dataset directory conventions.
//!
//! Every input and output location is derived from the dataset root passed on
//! the command line; nothing else configures the conversion.

use std::path::{Path, PathBuf};

/// Name of the JSON sidecar written next to the participants table.
pub const PARTICIPANTS_SIDECAR: &str = "participants.json";

/// One measurement column of a regional sheet and the suffix used for its
/// output columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub column: usize,
    pub suffix: &'static str,
}

const fn measurement(column: usize, suffix: &'static str) -> Measurement {
    Measurement { column, suffix }
}

/// A worksheet of a subject workbook together with the columns flattened
/// out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSpec {
    pub name: &'static str,
    pub measurements: &'static [Measurement],
}

/// Per-modality constants for the regional variable tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalitySpec {
    pub name: &'static str,
    pub variables_dir: &'static str,
    pub reference_file: &'static str,
    pub sheets: [SheetSpec; 2],
}

impl ModalitySpec {
    /// Number of measurement types flattened per region.
    pub fn measurements_per_region(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.measurements.len()).sum()
    }
}

const DTI_SHEET: SheetSpec = SheetSpec {
    name: "DTI contrasts (all)",
    measurements: &[
        measurement(5, "DWI-Volume"),
        measurement(6, "AD-mean"),
        measurement(7, "FA-mean"),
        measurement(8, "MD-mean"),
        measurement(9, "RD-mean"),
    ],
};

pub const INVIVO: ModalitySpec = ModalitySpec {
    name: "invivo",
    variables_dir: "invivo/i_Variables_gm",
    reference_file: "Brain_001_summary.xlsx",
    sheets: [
        SheetSpec {
            name: "T1&2w contrasts (all)",
            measurements: &[
                measurement(5, "Anat-Volume"),
                measurement(6, "T1w-mean"),
                measurement(7, "T2w-mean"),
                measurement(8, "T1T2-mean"),
            ],
        },
        DTI_SHEET,
    ],
};

pub const EXVIVO: ModalitySpec = ModalitySpec {
    name: "exvivo",
    variables_dir: "exvivo/e_Variables_gm",
    reference_file: "Brain_ex001_summary.xlsx",
    sheets: [
        SheetSpec {
            name: "T2w contrast (all)",
            measurements: &[measurement(5, "Anat-Volume"), measurement(6, "T2w-mean")],
        },
        DTI_SHEET,
    ],
};

/// Resolved input and output paths of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn invivo_roster(&self) -> PathBuf {
        self.root
            .join("invivo/i_Individual_List/Individual_information_invivo.xlsx")
    }

    pub fn exvivo_roster(&self) -> PathBuf {
        self.root
            .join("exvivo/e_Individual_List/individual_information_exvivo.xlsx")
    }

    pub fn variables_dir(&self, modality: &ModalitySpec) -> PathBuf {
        self.root.join(modality.variables_dir)
    }

    pub fn reference_workbook(&self, modality: &ModalitySpec) -> PathBuf {
        self.variables_dir(modality).join(modality.reference_file)
    }

    pub fn label_source(&self, atlas: &str) -> PathBuf {
        self.root
            .join("invivo")
            .join(format!("i_{atlas}"))
            .join(format!("{atlas}_classification.xlsx"))
    }

    pub fn rawdata_dir(&self) -> PathBuf {
        self.root.join("bids/rawdata")
    }

    pub fn derivatives_dir(&self) -> PathBuf {
        self.root.join("bids/derivatives")
    }

    pub fn participants_table(&self) -> PathBuf {
        self.rawdata_dir().join("participants.tsv")
    }

    pub fn participants_sidecar(&self) -> PathBuf {
        self.rawdata_dir().join(PARTICIPANTS_SIDECAR)
    }

    pub fn variables_table(&self, modality: &ModalitySpec) -> PathBuf {
        self.derivatives_dir()
            .join("tabular-v1.0.0")
            .join(format!("{}-variables.tsv", modality.name))
    }

    pub fn label_table(&self, atlas: &str) -> PathBuf {
        self.derivatives_dir()
            .join("outputs-v1.0.0")
            .join(format!("tpl-NA216_atlas-{atlas}_dseg.tsv"))
    }
}
