#![allow(dead_code)]

use std::fs;
use std::path::Path;

use rust_xlsxwriter::Workbook;

/// A cell written into a fixture workbook.
#[derive(Debug, Clone, Copy)]
pub enum Fx {
    Text(&'static str),
    Num(f64),
    Blank,
}

impl From<&'static str> for Fx {
    fn from(value: &'static str) -> Self {
        Fx::Text(value)
    }
}

impl From<f64> for Fx {
    fn from(value: f64) -> Self {
        Fx::Num(value)
    }
}

pub type Sheet = (&'static str, Vec<Vec<Fx>>);

/// Writes the given sheets, in order, to a new workbook.
pub fn write_workbook(path: &Path, sheets: &[Sheet]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("fixture directory");
    }
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).expect("sheet name");
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let (row_idx, col_idx) = (row_idx as u32, col_idx as u16);
                match cell {
                    Fx::Text(value) => {
                        worksheet
                            .write_string(row_idx, col_idx, *value)
                            .expect("string cell");
                    }
                    Fx::Num(value) => {
                        worksheet
                            .write_number(row_idx, col_idx, *value)
                            .expect("number cell");
                    }
                    Fx::Blank => {}
                }
            }
        }
    }
    workbook.save(path).expect("fixture workbook saved");
}

/// Hemisphere, label and abbreviation of a region.
pub type Region = (&'static str, &'static str, &'static str);

pub const REGIONS: [Region; 3] = [
    ("L", "Cortex", "Cx"),
    ("R", "Cortex", "Cx"),
    ("", "Brainstem", "BS"),
];

/// Value stored for a region/measurement pair of a regional sheet.
pub fn measurement_value(base: f64, region: usize, measurement: usize) -> f64 {
    base + region as f64 * 10.0 + measurement as f64
}

/// A regional measurement sheet: index, key columns, a label id, then
/// `measurements` numeric columns starting at column 5.
pub fn regional_sheet(name: &'static str, regions: &[Region], measurements: usize, base: f64) -> Sheet {
    let mut header: Vec<Fx> = vec![
        "No".into(),
        "Hemisphere".into(),
        "Label".into(),
        "Abbreviation".into(),
        "Label ID".into(),
    ];
    header.extend((0..measurements).map(|_| Fx::Text("value")));

    let mut rows = vec![header];
    for (region_idx, (hemisphere, label, abbreviation)) in regions.iter().enumerate() {
        let mut row = vec![
            Fx::Num((region_idx + 1) as f64),
            if hemisphere.is_empty() {
                Fx::Blank
            } else {
                Fx::Text(*hemisphere)
            },
            Fx::Text(*label),
            Fx::Text(*abbreviation),
            Fx::Num((region_idx + 100) as f64),
        ];
        row.extend((0..measurements).map(|m| Fx::Num(measurement_value(base, region_idx, m))));
        rows.push(row);
    }
    (name, rows)
}

pub fn invivo_sheets(regions: &[Region], base: f64) -> Vec<Sheet> {
    vec![
        regional_sheet("T1&2w contrasts (all)", regions, 4, base),
        regional_sheet("DTI contrasts (all)", regions, 5, base + 1000.0),
    ]
}

pub fn exvivo_sheets(regions: &[Region], base: f64) -> Vec<Sheet> {
    vec![
        regional_sheet("T2w contrast (all)", regions, 2, base),
        regional_sheet("DTI contrasts (all)", regions, 5, base + 1000.0),
    ]
}

pub fn invivo_roster_rows() -> Vec<Vec<Fx>> {
    let header = [
        "In vivo Database Number",
        "Age",
        "Sex",
        "Weight",
        "Notes",
        "T2w",
        "dMRI",
        "Label",
        "Anesthetized",
        "Awake",
        "ex vivo Data",
    ];
    vec![
        header.iter().map(|h| Fx::Text(*h)).collect(),
        vec![
            Fx::Num(2.0),
            Fx::Num(30.0),
            "F".into(),
            Fx::Num(410.0),
            Fx::Blank,
            Fx::Num(1.0),
            Fx::Num(0.0),
            Fx::Num(0.0),
            Fx::Num(1.0),
            Fx::Blank,
            "-".into(),
        ],
        vec![
            Fx::Num(1.0),
            Fx::Num(24.0),
            "M".into(),
            Fx::Num(350.5),
            Fx::Blank,
            Fx::Num(0.0),
            Fx::Num(1.0),
            Fx::Num(1.0),
            Fx::Num(0.0),
            Fx::Num(1.0),
            "ex001".into(),
        ],
    ]
}

pub fn exvivo_roster_rows() -> Vec<Vec<Fx>> {
    let header = [
        "ex vivo Database Number",
        "Age",
        "Sex",
        "Notes",
        "T2w",
        "dMRI",
        "Label",
        "in vivo Data",
    ];
    vec![
        header.iter().map(|h| Fx::Text(*h)).collect(),
        vec![
            "ex001".into(),
            Fx::Num(36.0),
            "M".into(),
            Fx::Blank,
            Fx::Num(1.0),
            Fx::Blank,
            Fx::Num(1.0),
            "i001".into(),
        ],
        vec![
            "ex005".into(),
            Fx::Num(80.0),
            "F".into(),
            Fx::Blank,
            Fx::Num(1.0),
            Fx::Num(1.0),
            Fx::Num(0.0),
            "-".into(),
        ],
    ]
}

pub fn label_rows(labels: &[(f64, &'static str)]) -> Vec<Vec<Fx>> {
    let mut rows = vec![vec![Fx::Text("Number"), Fx::Text("Region Name")]];
    rows.extend(
        labels
            .iter()
            .map(|(number, name)| vec![Fx::Num(*number), Fx::Text(*name)]),
    );
    rows
}

/// Writes a complete dataset: rosters, two subjects per modality plus the
/// reference workbooks, and both classification workbooks.
pub fn write_dataset(root: &Path) {
    write_workbook(
        &root.join("invivo/i_Individual_List/Individual_information_invivo.xlsx"),
        &[("Sheet1", invivo_roster_rows())],
    );
    write_workbook(
        &root.join("exvivo/e_Individual_List/individual_information_exvivo.xlsx"),
        &[("Sheet1", exvivo_roster_rows())],
    );

    let invivo_dir = root.join("invivo/i_Variables_gm");
    write_workbook(&invivo_dir.join("Brain_001_summary.xlsx"), &invivo_sheets(&REGIONS, 0.0));
    write_workbook(&invivo_dir.join("Brain_002_summary.xlsx"), &invivo_sheets(&REGIONS, 5000.0));

    let exvivo_dir = root.join("exvivo/e_Variables_gm");
    write_workbook(&exvivo_dir.join("Brain_ex001_summary.xlsx"), &exvivo_sheets(&REGIONS, 0.0));
    write_workbook(
        &exvivo_dir.join("Brain_ex005_i002_summary.xlsx"),
        &exvivo_sheets(&REGIONS, 7000.0),
    );

    write_workbook(
        &root.join("invivo/i_Label052/Label052_classification.xlsx"),
        &[("Sheet1", label_rows(&[(1.0, "Frontal"), (2.0, "Parietal")]))],
    );
    write_workbook(
        &root.join("invivo/i_Label111/Label111_classification.xlsx"),
        &[("Sheet1", label_rows(&[(1.0, "Area 4"), (2.0, "Area 6"), (3.0, "Area 8")]))],
    );
}

/// Parses a TSV file into its header and rows.
pub fn read_tsv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let content = fs::read_to_string(path).expect("TSV readable");
    let mut lines = content.lines();
    let header = lines
        .next()
        .expect("header row")
        .split('\t')
        .map(str::to_string)
        .collect();
    let rows = lines
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect();
    (header, rows)
}
