//! Builds `participants.tsv` and its JSON sidecar from the two subject rosters.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fs;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ToolError};
use crate::io::{excel_read, tsv_write};
use crate::layout::DatasetLayout;
use crate::model::{CellValue, Table};

/// Species recorded for every participant.
pub const SPECIES: &str = "callithrix-jacchus";

/// Marker used by the ex vivo roster when a subject has no in vivo data.
pub const NO_INVIVO_PLACEHOLDER: &str = "-";

const INVIVO_MIN_COLUMNS: usize = 11;
const EXVIVO_MIN_COLUMNS: usize = 8;

/// Output columns of the participants table, in order.
pub const PARTICIPANT_COLUMNS: [&str; 15] = [
    "participant_id",
    "species",
    "age",
    "sex",
    "weight",
    "exvivo_db",
    "age_exvivo",
    "iv_t2",
    "iv_dmri",
    "iv_label",
    "iv_aneth",
    "iv_awake",
    "ev_t2",
    "ev_dmri",
    "ev_label",
];

/// Image availability recorded by the in vivo roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvivoImages {
    pub t2: bool,
    pub dmri: bool,
    pub label: bool,
    pub anesthetized: bool,
    pub awake: bool,
}

/// Image availability recorded by the ex vivo roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExvivoImages {
    pub t2: bool,
    pub dmri: bool,
    pub label: bool,
}

/// A row of the in vivo roster.
#[derive(Debug, Clone, PartialEq)]
pub struct InvivoEntry {
    pub participant_id: String,
    pub age: CellValue,
    pub sex: CellValue,
    pub weight: CellValue,
    pub images: InvivoImages,
}

/// A row of the ex vivo roster, keyed by the identifier it joins on.
#[derive(Debug, Clone, PartialEq)]
pub struct ExvivoEntry {
    pub participant_id: String,
    pub database_number: String,
    pub age: CellValue,
    pub sex: CellValue,
    pub images: ExvivoImages,
}

/// One row of the merged participants table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantRecord {
    pub participant_id: String,
    pub age: CellValue,
    pub sex: CellValue,
    pub weight: CellValue,
    pub exvivo_db: CellValue,
    pub age_exvivo: CellValue,
    pub invivo_images: InvivoImages,
    pub exvivo_images: ExvivoImages,
}

impl ParticipantRecord {
    fn into_row(self) -> Vec<CellValue> {
        let iv = self.invivo_images;
        let ev = self.exvivo_images;
        vec![
            CellValue::Text(self.participant_id),
            CellValue::from(SPECIES),
            self.age,
            self.sex,
            self.weight,
            self.exvivo_db,
            self.age_exvivo,
            iv.t2.into(),
            iv.dmri.into(),
            iv.label.into(),
            iv.anesthetized.into(),
            iv.awake.into(),
            ev.t2.into(),
            ev.dmri.into(),
            ev.label.into(),
        ]
    }
}

/// Reads both rosters, merges them and writes the participants table and
/// sidecar. Returns the number of participants written.
#[instrument(level = "info", skip_all, fields(root = %layout.root().display()))]
pub fn build_participants(layout: &DatasetLayout) -> Result<usize> {
    info!("creating participants table");

    let invivo = read_roster(&layout.invivo_roster())?;
    let exvivo = read_roster(&layout.exvivo_roster())?;

    let invivo = parse_invivo_roster(&invivo)?;
    let exvivo = parse_exvivo_roster(&exvivo)?;
    debug!(
        invivo_rows = invivo.len(),
        exvivo_rows = exvivo.len(),
        "rosters parsed"
    );

    let records = merge_rosters(invivo, exvivo);
    let count = records.len();
    let table = participants_table(records)?;

    tsv_write::write_table(&layout.participants_table(), &table)?;
    let sidecar = serde_json::to_string_pretty(&participants_sidecar())?;
    fs::write(layout.participants_sidecar(), sidecar)?;

    info!(participants = count, "participants table written");
    Ok(count)
}

fn read_roster(path: &std::path::Path) -> Result<Table> {
    let mut workbook = excel_read::open(path)?;
    let range = excel_read::read_first_sheet(&mut workbook)?;
    excel_read::sheet_table(&range)
}

/// Canonical identifier of an in vivo database number (`7` → `sub-007`).
pub fn invivo_participant_id(cell: &CellValue) -> Result<Option<String>> {
    if cell.is_missing() {
        return Ok(None);
    }
    match cell.as_number() {
        Some(number) if number.fract() == 0.0 && number >= 0.0 => {
            Ok(Some(format!("sub-{:03}", number as u64)))
        }
        _ => Err(ToolError::InvalidWorkbook(format!(
            "in vivo database number '{cell}' is not a non-negative integer"
        ))),
    }
}

/// Identifier an ex vivo roster row joins on.
///
/// A cross-reference such as `i012` maps onto `sub-012`; the placeholder (or a
/// blank cell) falls back to the ex vivo database number, `ex005` becoming
/// `sub-ex005`.
pub fn exvivo_participant_id(database_number: &str, invivo_reference: &str) -> String {
    let reference = invivo_reference.trim();
    if reference.is_empty() || reference == NO_INVIVO_PLACEHOLDER {
        database_number.trim().replace("ex", "sub-ex")
    } else {
        reference.replace('i', "sub-")
    }
}

/// Whether an image-availability cell marks the image as present.
pub fn is_present(cell: &CellValue) -> bool {
    match cell {
        CellValue::Missing => false,
        CellValue::Number(value) => *value != 0.0 && !value.is_nan(),
        CellValue::Flag(value) => *value,
        CellValue::Text(value) => {
            let value = value.trim();
            !value.is_empty() && value != "0" && value != NO_INVIVO_PLACEHOLDER
        }
    }
}

fn require_columns(table: &Table, minimum: usize, roster: &str) -> Result<()> {
    if table.columns.len() < minimum {
        return Err(ToolError::InvalidWorkbook(format!(
            "{roster} roster has {} columns, expected at least {minimum}",
            table.columns.len()
        )));
    }
    Ok(())
}

/// Parses the in vivo roster by column position.
pub fn parse_invivo_roster(table: &Table) -> Result<Vec<InvivoEntry>> {
    require_columns(table, INVIVO_MIN_COLUMNS, "in vivo")?;

    let mut entries = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let Some(participant_id) = invivo_participant_id(&row[0])? else {
            continue;
        };
        entries.push(InvivoEntry {
            participant_id,
            age: row[1].clone(),
            sex: row[2].clone(),
            weight: row[3].clone(),
            images: InvivoImages {
                t2: is_present(&row[5]),
                dmri: is_present(&row[6]),
                label: is_present(&row[7]),
                anesthetized: is_present(&row[8]),
                awake: is_present(&row[9]),
            },
        });
    }
    Ok(entries)
}

/// Parses the ex vivo roster by column position.
pub fn parse_exvivo_roster(table: &Table) -> Result<Vec<ExvivoEntry>> {
    require_columns(table, EXVIVO_MIN_COLUMNS, "ex vivo")?;

    let mut entries = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let database_number = excel_read::cell_text(row.first());
        if database_number.trim().is_empty() {
            continue;
        }
        let reference = excel_read::cell_text(row.get(7));
        entries.push(ExvivoEntry {
            participant_id: exvivo_participant_id(&database_number, &reference),
            database_number: database_number.trim().to_string(),
            age: row[1].clone(),
            sex: row[2].clone(),
            images: ExvivoImages {
                t2: is_present(&row[4]),
                dmri: is_present(&row[5]),
                label: is_present(&row[6]),
            },
        });
    }
    Ok(entries)
}

/// Outer-joins the two rosters on the derived identifier. The result is
/// sorted by identifier and holds one record per identifier.
pub fn merge_rosters(invivo: Vec<InvivoEntry>, exvivo: Vec<ExvivoEntry>) -> Vec<ParticipantRecord> {
    let mut joined: BTreeMap<String, (Option<InvivoEntry>, Option<ExvivoEntry>)> = BTreeMap::new();

    for entry in invivo {
        match joined.entry(entry.participant_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert((Some(entry), None));
            }
            Entry::Occupied(_) => {
                warn!(participant_id = %entry.participant_id, "duplicate in vivo roster row ignored");
            }
        }
    }

    for entry in exvivo {
        let slot = joined.entry(entry.participant_id.clone()).or_default();
        if slot.1.is_some() {
            warn!(participant_id = %entry.participant_id, "duplicate ex vivo roster row ignored");
            continue;
        }
        slot.1 = Some(entry);
    }

    joined
        .into_iter()
        .map(|(participant_id, (invivo, exvivo))| {
            if let (Some(iv), Some(ev)) = (&invivo, &exvivo) {
                check_sex(&participant_id, &iv.sex, &ev.sex);
            }

            let (age, sex, weight, invivo_images) = match invivo {
                Some(iv) => (iv.age, iv.sex, iv.weight, iv.images),
                None => (
                    CellValue::Missing,
                    CellValue::Missing,
                    CellValue::Missing,
                    InvivoImages::default(),
                ),
            };
            let (exvivo_db, age_exvivo, exvivo_images) = match exvivo {
                Some(ev) => (CellValue::Text(ev.database_number), ev.age, ev.images),
                None => (CellValue::Missing, CellValue::Missing, ExvivoImages::default()),
            };

            ParticipantRecord {
                participant_id,
                age,
                sex,
                weight,
                exvivo_db,
                age_exvivo,
                invivo_images,
                exvivo_images,
            }
        })
        .collect()
}

// The ex vivo sex column is dropped; disagreements are only reported.
fn check_sex(participant_id: &str, invivo: &CellValue, exvivo: &CellValue) {
    if invivo.is_missing() || exvivo.is_missing() {
        return;
    }
    let lhs = invivo.to_string();
    let rhs = exvivo.to_string();
    if !lhs.trim().eq_ignore_ascii_case(rhs.trim()) {
        warn!(
            participant_id,
            invivo_sex = %lhs,
            exvivo_sex = %rhs,
            "rosters disagree on sex; keeping in vivo value"
        );
    }
}

/// Lays the records out in [`PARTICIPANT_COLUMNS`] order.
pub fn participants_table(records: Vec<ParticipantRecord>) -> Result<Table> {
    let mut table = Table::new(PARTICIPANT_COLUMNS.iter().map(|c| c.to_string()).collect());
    for record in records {
        table.push_row(record.into_row())?;
    }
    Ok(table)
}

/// Meaning of the values of a categorical column.
#[derive(Debug, Clone, PartialEq)]
pub enum Levels {
    Text(&'static str),
    Coded(Vec<(&'static str, &'static str)>),
}

impl Serialize for Levels {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Levels::Text(text) => serializer.serialize_str(text),
            Levels::Coded(levels) => {
                let mut map = serializer.serialize_map(Some(levels.len()))?;
                for (code, meaning) in levels {
                    map.serialize_entry(code, meaning)?;
                }
                map.end()
            }
        }
    }
}

/// Sidecar entry describing one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    #[serde(rename = "Description")]
    pub description: &'static str,
    #[serde(rename = "Units", skip_serializing_if = "Option::is_none")]
    pub units: Option<&'static str>,
    #[serde(rename = "Levels", skip_serializing_if = "Option::is_none")]
    pub levels: Option<Levels>,
}

/// Column name → description mapping, serialized in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sidecar(pub Vec<(&'static str, ColumnDescription)>);

impl Serialize for Sidecar {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, description) in &self.0 {
            map.serialize_entry(column, description)?;
        }
        map.end()
    }
}

fn describe(description: &'static str) -> ColumnDescription {
    ColumnDescription {
        description,
        units: None,
        levels: None,
    }
}

fn availability(description: &'static str) -> ColumnDescription {
    ColumnDescription {
        levels: Some(Levels::Coded(vec![
            ("True", "image available"),
            ("False", "image not available"),
        ])),
        ..describe(description)
    }
}

/// Descriptions for every column of the participants table.
pub fn participants_sidecar() -> Sidecar {
    Sidecar(vec![
        ("participant_id", describe("Identifies unique subjects.")),
        (
            "species",
            ColumnDescription {
                levels: Some(Levels::Text("callithrix jacchus")),
                ..describe("The species of the animal described by the subject ID.")
            },
        ),
        (
            "age",
            ColumnDescription {
                units: Some("months"),
                ..describe("The age of the animal at observation.")
            },
        ),
        (
            "sex",
            ColumnDescription {
                levels: Some(Levels::Coded(vec![("M", "male"), ("F", "female")])),
                ..describe("The gender of the animal.")
            },
        ),
        (
            "weight",
            ColumnDescription {
                units: Some("grams"),
                ..describe("The weight of the animal at observation.")
            },
        ),
        (
            "exvivo_db",
            describe("The participant ID used when acquiring exvivo data."),
        ),
        (
            "age_exvivo",
            ColumnDescription {
                units: Some("months"),
                ..describe("The age of the animal when the brain was preserved.")
            },
        ),
        ("iv_t2", availability("An in vivo T2-weighted image was acquired.")),
        ("iv_dmri", availability("An in vivo diffusion image was acquired.")),
        ("iv_label", availability("An in vivo label image is available.")),
        (
            "iv_aneth",
            availability("An in vivo image was acquired under anesthesia."),
        ),
        ("iv_awake", availability("An in vivo image was acquired awake.")),
        ("ev_t2", availability("An ex vivo T2-weighted image was acquired.")),
        ("ev_dmri", availability("An ex vivo diffusion image was acquired.")),
        ("ev_label", availability("An ex vivo label image is available.")),
    ])
}
