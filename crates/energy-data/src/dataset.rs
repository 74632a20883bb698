//! The unified dataset and the merger that builds it.

use std::path::PathBuf;

use energy_core::models::{BuildingManager, CanonicalRow};
use serde::Serialize;

use crate::schema::ReconciledFile;

// ── Per-file bookkeeping ──────────────────────────────────────────────────────

/// Load statistics for one file that made it into the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileLoadSummary {
    pub path: PathBuf,
    pub building: String,
    pub month: String,
    pub kwh_source: String,
    pub rows_accepted: usize,
    pub rows_skipped: usize,
}

/// A file excluded from the dataset and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub reason: String,
}

// ── UnifiedDataset ────────────────────────────────────────────────────────────

/// Canonical rows from every loaded file, in file-then-row order.
#[derive(Debug, Clone, Default)]
pub struct UnifiedDataset {
    rows: Vec<CanonicalRow>,
    files: Vec<FileLoadSummary>,
    failed: Vec<FailedFile>,
}

impl UnifiedDataset {
    /// Wrap already-reconciled rows, e.g. for aggregation in isolation.
    pub fn from_rows(rows: Vec<CanonicalRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[CanonicalRow] {
        &self.rows
    }

    /// Files that contributed to the dataset, in discovery order.
    pub fn files(&self) -> &[FileLoadSummary] {
        &self.files
    }

    /// Files that were excluded, in discovery order.
    pub fn failed_files(&self) -> &[FailedFile] {
        &self.failed
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows_skipped(&self) -> usize {
        self.files.iter().map(|f| f.rows_skipped).sum()
    }

    /// Sum of every row's quantity, missing values counting as zero.
    pub fn total_kwh(&self) -> f64 {
        self.rows.iter().map(CanonicalRow::kwh_or_zero).sum()
    }

    /// A fresh building registry populated from this dataset, in row order.
    pub fn building_manager(&self) -> BuildingManager {
        BuildingManager::from_rows(&self.rows)
    }

    /// Append one reconciled file's rows after everything merged so far.
    fn push_file(&mut self, file: ReconciledFile) {
        self.files.push(FileLoadSummary {
            path: file.path,
            building: file.metadata.building,
            month: file.metadata.month,
            kwh_source: file.kwh_source,
            rows_accepted: file.rows.len(),
            rows_skipped: file.rows_skipped,
        });
        self.rows.extend(file.rows);
    }
}

/// Concatenate reconciled files in the order given, keeping the list of
/// files that were excluded before the merge.
pub fn merge_files(
    files: impl IntoIterator<Item = ReconciledFile>,
    failed: Vec<FailedFile>,
) -> UnifiedDataset {
    let mut dataset = UnifiedDataset {
        failed,
        ..UnifiedDataset::default()
    };
    for file in files {
        dataset.push_file(file);
    }
    dataset
}

// ── LoadOutcome ───────────────────────────────────────────────────────────────

/// Result of a load: either a non-empty dataset or an explicit empty marker.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// No candidate files were discovered.
    NoInput { data_dir: PathBuf },
    /// Files were found but none contributed a row.
    NoUsableRows {
        files_found: usize,
        failed: Vec<FailedFile>,
    },
    /// At least one row was merged.
    Loaded(UnifiedDataset),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
