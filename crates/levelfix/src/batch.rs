//! Batch processing with per-file error isolation: one malformed
//! document is flagged and passed through, the rest of the batch keeps
//! going.

use crate::repair::Repairer;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// Prefix given to the passthrough copy of a file that failed to parse.
const ERROR_PREFIX: &str = "ERROR_";

/// One uploaded document.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub filename: String,
    pub content: Vec<u8>,
}

/// One output document. Failed inputs come back under an
/// `ERROR_`-prefixed name with their original bytes untouched.
#[derive(Debug, Clone)]
pub struct RepairedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Success,
    Error,
}

/// Per-file report row, rendered by both the JSON and CSV surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub filename: String,
    pub status: FileStatus,
    pub modifications: usize,
    pub elapsed_seconds: f64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatchSummary {
    pub files: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub modifications: usize,
}

#[derive(Debug)]
pub struct BatchResult {
    pub files: Vec<RepairedFile>,
    pub reports: Vec<FileReport>,
}

impl BatchResult {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            files: self.reports.len(),
            succeeded: self
                .reports
                .iter()
                .filter(|report| report.status == FileStatus::Success)
                .count(),
            failed: self
                .reports
                .iter()
                .filter(|report| report.status == FileStatus::Error)
                .count(),
            modifications: self.reports.iter().map(|report| report.modifications).sum(),
        }
    }
}

/// Runs the repairer over every input. Documents are independent, so a
/// failure is recorded and the loop moves on.
pub fn process_batch(repairer: &Repairer, inputs: Vec<BatchInput>) -> BatchResult {
    let mut files = Vec::with_capacity(inputs.len());
    let mut reports = Vec::with_capacity(inputs.len());

    for input in inputs {
        let started = Instant::now();
        match repairer.repair(&input.content) {
            Ok(outcome) => {
                let elapsed_seconds = round_elapsed(started);
                info!(
                    file = %input.filename,
                    modifications = outcome.modifications(),
                    elapsed_seconds,
                    "repaired"
                );
                reports.push(FileReport {
                    filename: input.filename.clone(),
                    status: FileStatus::Success,
                    modifications: outcome.modifications(),
                    elapsed_seconds,
                    error: None,
                });
                files.push(RepairedFile {
                    filename: input.filename,
                    content: outcome.output,
                });
            }
            Err(err) => {
                let elapsed_seconds = round_elapsed(started);
                warn!(file = %input.filename, error = %err, "repair failed, passing file through");
                reports.push(FileReport {
                    filename: input.filename.clone(),
                    status: FileStatus::Error,
                    modifications: 0,
                    elapsed_seconds,
                    error: Some(err.to_string()),
                });
                files.push(RepairedFile {
                    filename: format!("{ERROR_PREFIX}{}", input.filename),
                    content: input.content,
                });
            }
        }
    }

    BatchResult { files, reports }
}

fn round_elapsed(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 1000.0).round() / 1000.0
}
