//! JSON placement documents for downstream mesh instancing

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::algorithm::executor::{RunOutcome, RunReport};
use crate::algorithm::projection::PlacementRecord;
use crate::io::error::{Result, WfcError};
use crate::spatial::grid::Coord;

/// Serialized form of one run
#[derive(Debug, Serialize)]
pub struct PlacementDocument<'a> {
    /// Seed of the run
    pub seed: u64,
    /// Grid dimensions `[x, y, z]`
    pub size: [usize; 3],
    /// `collapsed`, `contradiction` or `step_limit`
    pub outcome: &'static str,
    /// Cell whose domain emptied, for contradicted runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contradiction: Option<Coord>,
    /// Collapses performed
    pub steps: usize,
    /// Wall-clock run time in milliseconds
    pub elapsed_ms: u64,
    /// Collapsed cells in flat order
    pub placements: &'a [PlacementRecord],
}

impl<'a> From<&'a RunReport> for PlacementDocument<'a> {
    fn from(report: &'a RunReport) -> Self {
        let contradiction = match report.outcome {
            RunOutcome::Contradiction(contradiction) => Some(contradiction.coord),
            RunOutcome::Collapsed | RunOutcome::StepLimit => None,
        };
        Self {
            seed: report.seed,
            size: report.size.to_array(),
            outcome: report.outcome.label(),
            contradiction,
            steps: report.steps,
            elapsed_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            placements: &report.placements,
        }
    }
}

/// Render one report as pretty-printed JSON
///
/// # Errors
///
/// Returns a serialization error if the document cannot be encoded
pub fn report_to_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(&PlacementDocument::from(report)).map_err(|source| {
        WfcError::Serialization {
            path: "<memory>".into(),
            source,
        }
    })
}

/// Write reports to a JSON file
///
/// A single report is written as one document, several as an array of
/// documents in the given order.
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory or the file cannot be created
/// - Serialization fails
pub fn export_reports(reports: &[RunReport], output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| WfcError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source,
        })?;
    }

    let file = File::create(output_path).map_err(|source| WfcError::FileSystem {
        path: output_path.to_path_buf(),
        operation: "create file",
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let written = match reports {
        [report] => serde_json::to_writer_pretty(&mut writer, &PlacementDocument::from(report)),
        _ => {
            let documents: Vec<PlacementDocument<'_>> =
                reports.iter().map(PlacementDocument::from).collect();
            serde_json::to_writer_pretty(&mut writer, &documents)
        }
    };
    written.map_err(|source| WfcError::Serialization {
        path: output_path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| WfcError::FileSystem {
        path: output_path.to_path_buf(),
        operation: "write file",
        source,
    })?;

    log::debug!(
        "Wrote {} run(s) to {}",
        reports.len(),
        output_path.display()
    );
    Ok(())
}
