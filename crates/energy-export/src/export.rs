//! CSV export of the merged dataset and the aggregate tables.
//!
//! Each table goes to its own file under the output directory; the directory
//! is created when missing.

use std::path::{Path, PathBuf};

use energy_core::error::{EnergyError, Result};
use energy_core::models::CanonicalRow;
use energy_core::time_utils::{DATE_FORMAT, TIMESTAMP_FORMAT};
use energy_data::aggregator::{BucketTotal, BuildingSummary};
use energy_data::analysis::PipelineReport;
use tracing::info;

use crate::summary::write_summary;

// ── File names ────────────────────────────────────────────────────────────────

pub const CLEANED_DATA_FILE: &str = "cleaned_energy_data.csv";
pub const BUILDING_SUMMARY_FILE: &str = "building_summary.csv";
pub const DAILY_TOTALS_FILE: &str = "daily_totals.csv";
pub const WEEKLY_TOTALS_FILE: &str = "weekly_totals.csv";
pub const SUMMARY_FILE: &str = "summary.txt";

/// Paths of every file written by [`export_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFiles {
    pub cleaned_data: PathBuf,
    pub building_summary: PathBuf,
    pub daily_totals: PathBuf,
    pub weekly_totals: PathBuf,
    pub summary: PathBuf,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Write the dataset, the aggregate tables and the campus summary into
/// `output_dir`.
pub fn export_all(report: &PipelineReport, output_dir: &Path) -> Result<ExportedFiles> {
    std::fs::create_dir_all(output_dir).map_err(|source| EnergyError::FileWrite {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let files = ExportedFiles {
        cleaned_data: output_dir.join(CLEANED_DATA_FILE),
        building_summary: output_dir.join(BUILDING_SUMMARY_FILE),
        daily_totals: output_dir.join(DAILY_TOTALS_FILE),
        weekly_totals: output_dir.join(WEEKLY_TOTALS_FILE),
        summary: output_dir.join(SUMMARY_FILE),
    };

    write_dataset(report.dataset.rows(), &files.cleaned_data)?;
    write_building_summary(&report.building_summary, &files.building_summary)?;
    write_bucket_totals(&report.daily, &files.daily_totals)?;
    write_bucket_totals(&report.weekly, &files.weekly_totals)?;
    write_summary(report, &files.summary)?;

    info!("Exported summary + CSVs to {}", output_dir.display());
    Ok(files)
}

/// `timestamp,kwh,building,month`, one line per canonical row.
///
/// A missing quantity is written as an empty cell.
pub fn write_dataset(rows: &[CanonicalRow], path: &Path) -> Result<()> {
    let mut writer = open_writer(path)?;
    write_record(&mut writer, path, ["timestamp", "kwh", "building", "month"])?;
    for row in rows {
        write_record(
            &mut writer,
            path,
            [
                row.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                row.kwh.map(|v| v.to_string()).unwrap_or_default(),
                row.building.clone(),
                row.month.clone(),
            ],
        )?;
    }
    finish(writer, path)
}

/// `building,min,max,mean,sum`, one line per building in summary order.
pub fn write_building_summary(summaries: &[BuildingSummary], path: &Path) -> Result<()> {
    let mut writer = open_writer(path)?;
    write_record(&mut writer, path, ["building", "min", "max", "mean", "sum"])?;
    for s in summaries {
        let cell = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        write_record(
            &mut writer,
            path,
            [
                s.building.clone(),
                cell(s.min),
                cell(s.max),
                cell(s.mean),
                s.sum.to_string(),
            ],
        )?;
    }
    finish(writer, path)
}

/// `timestamp,kwh`, one line per bucket, labelled by the bucket date.
pub fn write_bucket_totals(buckets: &[BucketTotal], path: &Path) -> Result<()> {
    let mut writer = open_writer(path)?;
    write_record(&mut writer, path, ["timestamp", "kwh"])?;
    for b in buckets {
        write_record(
            &mut writer,
            path,
            [b.bucket.format(DATE_FORMAT).to_string(), b.kwh.to_string()],
        )?;
    }
    finish(writer, path)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn open_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::Writer::from_path(path).map_err(|source| EnergyError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

fn write_record<I, T>(writer: &mut csv::Writer<std::fs::File>, path: &Path, record: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer
        .write_record(record)
        .map_err(|source| EnergyError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn finish(mut writer: csv::Writer<std::fs::File>, path: &Path) -> Result<()> {
    writer.flush().map_err(|source| EnergyError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
