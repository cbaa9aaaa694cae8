use tracing::{info, instrument};

use crate::error::Result;
use crate::labels;
use crate::layout::{DatasetLayout, EXVIVO, INVIVO};
use crate::participants;
use crate::variables;

/// Row counts of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    pub participants: usize,
    pub invivo_subjects: usize,
    pub exvivo_subjects: usize,
}

/// Runs every stage in order; the first fatal error stops the run.
#[instrument(level = "info", skip_all, fields(root = %layout.root().display()))]
pub fn convert_dataset(layout: &DatasetLayout) -> Result<ConversionSummary> {
    let participants = participants::build_participants(layout)?;
    let invivo_subjects = variables::build_variables(layout, INVIVO)?;
    let exvivo_subjects = variables::build_variables(layout, EXVIVO)?;
    labels::build_labels(layout)?;

    let summary = ConversionSummary {
        participants,
        invivo_subjects,
        exvivo_subjects,
    };
    info!(?summary, "conversion finished");
    Ok(summary)
}
