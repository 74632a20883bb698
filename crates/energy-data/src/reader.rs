//! Meter export discovery and loading.
//!
//! Lists the export files in the configured directory, reconciles each one
//! and merges the survivors into a
//! [`UnifiedDataset`](crate::dataset::UnifiedDataset).

use std::path::{Path, PathBuf};

use energy_core::settings::PipelineConfig;
use tracing::{debug, error, info, warn};

use crate::dataset::{merge_files, FailedFile, LoadOutcome};
use crate::schema::reconcile_file;

// ── Public API ────────────────────────────────────────────────────────────────

/// Find the files directly inside `data_dir` whose extension is `extension`,
/// sorted by path.
///
/// A missing directory yields an empty list.
pub fn find_source_files(data_dir: &Path, extension: &str) -> Vec<PathBuf> {
    if !data_dir.is_dir() {
        debug!("Data directory does not exist: {}", data_dir.display());
        return Vec::new();
    }

    let wanted = extension.trim_start_matches('.');

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == wanted)
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Discover, reconcile and merge every export under `config.data_dir`.
///
/// Files that fail to load are logged at error level and excluded; the run
/// continues with the remaining files. Zero discovered files log exactly one
/// warning and yield [`LoadOutcome::NoInput`].
pub fn load_unified_dataset(config: &PipelineConfig) -> LoadOutcome {
    let files = find_source_files(&config.data_dir, &config.extension);
    if files.is_empty() {
        warn!(
            "No {} files found in {}",
            config.extension,
            config.data_dir.display()
        );
        return LoadOutcome::NoInput {
            data_dir: config.data_dir.clone(),
        };
    }

    let mut reconciled = Vec::with_capacity(files.len());
    let mut failed = Vec::new();

    for path in &files {
        match reconcile_file(path, config) {
            Ok(file) => reconciled.push(file),
            Err(e) => {
                error!("Error reading {}: {}", path.display(), e);
                failed.push(FailedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let dataset = merge_files(reconciled, failed);

    if dataset.is_empty() {
        return LoadOutcome::NoUsableRows {
            files_found: files.len(),
            failed: dataset.failed_files().to_vec(),
        };
    }

    info!(
        "Merged {} rows from {} of {} files ({} rows skipped)",
        dataset.len(),
        dataset.files().len(),
        files.len(),
        dataset.rows_skipped()
    );

    LoadOutcome::Loaded(dataset)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
