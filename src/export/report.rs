//! Per-run JSON report

use super::json::{write_json_atomic, ExportMetadata, SCHEMA_VERSION};
use crate::error::Result;
use crate::pipeline::BatchSummary;
use crate::types::{FileTask, Outcome, ReconciledMetadata};
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub version: &'static str,
    pub metadata: ExportMetadata,
    pub summary: SummaryJson,
    pub files: Vec<FileJson<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SummaryJson {
    pub total: usize,
    pub renamed: usize,
    pub tagged_only: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct FileJson<'a> {
    pub path: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_to: Option<&'a Path>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
    #[serde(skip_serializing_if = "no_warnings")]
    pub warnings: &'a [String],
    pub recognition_attempted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<&'a ReconciledMetadata>,
    pub artwork_embedded: bool,
    pub lyrics_embedded: bool,
}

impl<'a> From<&'a FileTask> for FileJson<'a> {
    fn from(task: &'a FileTask) -> Self {
        Self {
            path: &task.path,
            renamed_to: task.renamed_to.as_deref(),
            outcome: task.outcome,
            reason: task.reason.as_deref(),
            warnings: &task.warnings,
            recognition_attempted: task.recognition_attempted,
            confidence: task.recognition_result.as_ref().map(|c| c.confidence_score),
            metadata: task.reconciled.as_ref(),
            artwork_embedded: task.artwork_embedded,
            lyrics_embedded: task.lyrics_embedded,
        }
    }
}

fn no_warnings(warnings: &&[String]) -> bool {
    warnings.is_empty()
}

/// Write the outcome of every processed file to `output_path`
pub fn write_report(tasks: &[FileTask], summary: &BatchSummary, output_path: &Path) -> Result<()> {
    let report = RunReport {
        version: SCHEMA_VERSION,
        metadata: ExportMetadata::now(),
        summary: SummaryJson {
            total: summary.total(),
            renamed: summary.count(Outcome::Renamed),
            tagged_only: summary.count(Outcome::TaggedOnly),
            skipped: summary.count(Outcome::Skipped),
            failed: summary.count(Outcome::Failed),
        },
        files: tasks.iter().map(FileJson::from).collect(),
    };

    write_json_atomic(&report, output_path)?;
    info!("Wrote report for {} files to {}", tasks.len(), output_path.display());
    Ok(())
}
