//! Per-file schema reconciliation.
//!
//! Opens one meter export, resolves its header against the canonical schema
//! (`timestamp`, `kwh` or an alias), tags each row with building / month
//! metadata from the filename and drops rows that fail to parse.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use energy_core::error::{EnergyError, Result};
use energy_core::models::{CanonicalRow, FileMetadata, KWH_ALIASES, KWH_COLUMN};
use energy_core::settings::PipelineConfig;
use chrono::NaiveDateTime;
use energy_core::time_utils::{parse_timestamp, Granularity};
use thiserror::Error;
use tracing::debug;

// ── ResolvedSchema ────────────────────────────────────────────────────────────

/// Column positions of the canonical fields inside one file's header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub timestamp_idx: usize,
    pub kwh_idx: usize,
    /// Header name the quantity was read from (`kwh` or one of its aliases).
    pub kwh_source: String,
    /// Number of fields every data row must carry.
    pub width: usize,
}

impl ResolvedSchema {
    /// Resolve `headers` once, up front.
    ///
    /// `kwh` wins when present; otherwise the first of [`KWH_ALIASES`] found
    /// is used and later aliases are ignored.
    pub fn resolve(headers: &StringRecord, timestamp_column: &str, path: &Path) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let timestamp_idx =
            position(timestamp_column).ok_or_else(|| EnergyError::MissingColumn {
                path: path.to_path_buf(),
                column: timestamp_column.to_string(),
            })?;

        let (kwh_idx, kwh_source) = std::iter::once(KWH_COLUMN)
            .chain(KWH_ALIASES.iter().copied())
            .find_map(|name| position(name).map(|idx| (idx, name.to_string())))
            .ok_or_else(|| EnergyError::MissingQuantityColumn {
                path: path.to_path_buf(),
                found: headers.iter().map(str::to_string).collect(),
            })?;

        Ok(Self {
            timestamp_idx,
            kwh_idx,
            kwh_source,
            width: headers.len(),
        })
    }
}

// ── ReconciledFile ────────────────────────────────────────────────────────────

/// The tagged row set produced from one source file.
#[derive(Debug, Clone)]
pub struct ReconciledFile {
    pub path: PathBuf,
    pub metadata: FileMetadata,
    pub kwh_source: String,
    pub rows: Vec<CanonicalRow>,
    /// Data rows dropped because they failed to parse.
    pub rows_skipped: usize,
}

/// Why a single data row was dropped.
#[derive(Error, Debug)]
enum RowFault {
    #[error("expected {expected} fields, found {found}")]
    Width { expected: usize, found: usize },

    #[error(transparent)]
    Timestamp(#[from] EnergyError),

    #[error("no weekly bucket for {0}")]
    OutOfRange(NaiveDateTime),

    #[error("non-numeric quantity {0:?}")]
    Quantity(String),

    #[error("unreadable record: {0}")]
    Record(csv::Error),
}

/// Building / month labels for `path`, from the filename minus extension.
pub fn metadata_for_path(path: &Path) -> FileMetadata {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    FileMetadata::from_stem(&stem)
}

/// Load one meter export and reconcile it into canonical rows.
///
/// Faults that make the whole file unusable (unopenable, unreadable header,
/// missing timestamp or quantity column, I/O failure mid-file, or every data
/// row rejected) are returned as errors so the caller can exclude the file.
/// Individual bad rows are dropped and counted.
pub fn reconcile_file(path: &Path, config: &PipelineConfig) -> Result<ReconciledFile> {
    let file = std::fs::File::open(path).map_err(|source| EnergyError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(std::io::BufReader::new(file));

    let headers = reader
        .headers()
        .map_err(|source| EnergyError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let schema = ResolvedSchema::resolve(&headers, &config.timestamp_column, path)?;
    let metadata = metadata_for_path(path);
    let weekly = Granularity::Weekly {
        anchor: config.week_anchor,
    };

    let mut rows = Vec::new();
    let mut rows_skipped = 0usize;

    for (line, result) in reader.records().enumerate() {
        let parsed = match result {
            Ok(record) => parse_row(&record, &schema, &metadata, weekly),
            Err(e) if e.is_io_error() => {
                return Err(EnergyError::Csv {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => Err(RowFault::Record(e)),
        };

        match parsed {
            Ok(row) => rows.push(row),
            Err(fault) => {
                rows_skipped += 1;
                debug!(
                    "Skipping data row {} of {}: {}",
                    line + 1,
                    path.display(),
                    fault
                );
            }
        }
    }

    if rows.is_empty() && rows_skipped > 0 {
        return Err(EnergyError::NoValidRows {
            path: path.to_path_buf(),
            skipped: rows_skipped,
        });
    }

    debug!(
        "File {}: {} rows accepted, {} skipped, quantity from \"{}\"",
        path.display(),
        rows.len(),
        rows_skipped,
        schema.kwh_source
    );

    Ok(ReconciledFile {
        path: path.to_path_buf(),
        metadata,
        kwh_source: schema.kwh_source,
        rows,
        rows_skipped,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse_row(
    record: &StringRecord,
    schema: &ResolvedSchema,
    metadata: &FileMetadata,
    weekly: Granularity,
) -> std::result::Result<CanonicalRow, RowFault> {
    if record.len() != schema.width {
        return Err(RowFault::Width {
            expected: schema.width,
            found: record.len(),
        });
    }

    let timestamp = parse_timestamp(&record[schema.timestamp_idx])?;
    if weekly.bucket_of(timestamp).is_none() {
        return Err(RowFault::OutOfRange(timestamp));
    }
    let kwh = parse_quantity(&record[schema.kwh_idx])?;

    Ok(CanonicalRow {
        timestamp,
        kwh,
        building: metadata.building.clone(),
        month: metadata.month.clone(),
    })
}

/// Empty cells and NaN become a missing quantity; infinities and other text
/// are faults.
fn parse_quantity(raw: &str) -> std::result::Result<Option<f64>, RowFault> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(v) if v.is_nan() => Ok(None),
        _ => Err(RowFault::Quantity(s.to_string())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Timelike};
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn headers(names: &[&str]) -> StringRecord {
        StringRecord::from(names.to_vec())
    }

    // ── ResolvedSchema::resolve ───────────────────────────────────────────────

    #[test]
    fn test_resolve_prefers_literal_kwh() {
        let schema = ResolvedSchema::resolve(
            &headers(&["timestamp", "energy", "kwh"]),
            "timestamp",
            Path::new("A_jan.csv"),
        )
        .unwrap();
        assert_eq!(schema.kwh_idx, 2);
        assert_eq!(schema.kwh_source, "kwh");
        assert_eq!(schema.width, 3);
    }

    #[test]
    fn test_resolve_alias_precedence_energy_before_units() {
        let schema = ResolvedSchema::resolve(
            &headers(&["units", "timestamp", "energy"]),
            "timestamp",
            Path::new("A_jan.csv"),
        )
        .unwrap();
        assert_eq!(schema.kwh_source, "energy");
        assert_eq!(schema.kwh_idx, 2);
    }

    #[test]
    fn test_resolve_alias_usage_before_units() {
        let schema = ResolvedSchema::resolve(
            &headers(&["timestamp", "units", "usage"]),
            "timestamp",
            Path::new("A_jan.csv"),
        )
        .unwrap();
        assert_eq!(schema.kwh_source, "usage");
    }

    #[test]
    fn test_resolve_missing_quantity_column() {
        let err = ResolvedSchema::resolve(
            &headers(&["timestamp", "power"]),
            "timestamp",
            Path::new("A_jan.csv"),
        )
        .unwrap_err();
        match err {
            EnergyError::MissingQuantityColumn { found, .. } => {
                assert_eq!(found, vec!["timestamp", "power"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_missing_timestamp_column() {
        let err = ResolvedSchema::resolve(
            &headers(&["time", "kwh"]),
            "timestamp",
            Path::new("A_jan.csv"),
        )
        .unwrap_err();
        assert!(matches!(err, EnergyError::MissingColumn { column, .. } if column == "timestamp"));
    }

    // ── metadata_for_path ─────────────────────────────────────────────────────

    #[test]
    fn test_metadata_for_path_middle_tokens_ignored() {
        let meta = metadata_for_path(Path::new("/data/C_2023_03.csv"));
        assert_eq!(meta.building, "C");
        assert_eq!(meta.month, "03");
    }

    // ── reconcile_file ────────────────────────────────────────────────────────

    #[test]
    fn test_reconcile_tags_rows_with_metadata() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(
            tmp.path(),
            "A_jan.csv",
            "timestamp,kwh\n2024-01-01 00:00:00,10\n2024-01-01 01:00:00,20\n",
        );
        let file = reconcile_file(&path, &PipelineConfig::default()).unwrap();

        assert_eq!(file.rows.len(), 2);
        assert_eq!(file.rows_skipped, 0);
        assert_eq!(file.kwh_source, "kwh");
        assert!(file
            .rows
            .iter()
            .all(|r| r.building == "A" && r.month == "jan"));
        assert_eq!(file.rows[1].kwh, Some(20.0));
        assert_eq!(file.rows[1].timestamp.hour(), 1);
    }

    #[test]
    fn test_reconcile_renames_alias() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(
            tmp.path(),
            "Lab_feb.csv",
            "units,timestamp,energy\n1,2024-02-01,7.5\n",
        );
        let file = reconcile_file(&path, &PipelineConfig::default()).unwrap();
        assert_eq!(file.kwh_source, "energy");
        assert_eq!(file.rows[0].kwh, Some(7.5));
    }

    #[test]
    fn test_reconcile_drops_bad_rows_individually() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("B_jan.csv");
        let mut content = b"timestamp,kwh\n\
             2024-01-01 00:00:00,5\n\
             garbage,6\n\
             2024-01-01 02:00:00,abc\n\
             2024-01-01 03:00:00,1,extra\n\
             2024-01-01 03:30:00,inf\n\
             2024-01-01 03:45:00,"
            .to_vec();
        content.extend_from_slice(b"\xff\xfe\n");
        content.extend_from_slice(b"2024-01-01 04:00:00,\n");
        std::fs::write(&path, content).unwrap();

        let file = reconcile_file(&path, &PipelineConfig::default()).unwrap();

        assert_eq!(file.rows.len(), 2);
        assert_eq!(file.rows_skipped, 5);
        assert_eq!(file.rows[0].kwh, Some(5.0));
        assert_eq!(file.rows[1].kwh, None);
    }

    #[test]
    fn test_reconcile_all_timestamps_bad_excludes_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(
            tmp.path(),
            "X_jan.csv",
            "timestamp,kwh\nyesterday,1\ntomorrow,2\n",
        );
        let err = reconcile_file(&path, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, EnergyError::NoValidRows { skipped: 2, .. }));
    }

    #[test]
    fn test_reconcile_header_only_is_empty_not_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(tmp.path(), "E_mar.csv", "timestamp,kwh\n");
        let file = reconcile_file(&path, &PipelineConfig::default()).unwrap();
        assert!(file.rows.is_empty());
        assert_eq!(file.rows_skipped, 0);
    }

    #[test]
    fn test_reconcile_missing_quantity_column_is_file_fault() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(tmp.path(), "F_mar.csv", "timestamp,watts\n2024-03-01,1\n");
        let err = reconcile_file(&path, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, EnergyError::MissingQuantityColumn { .. }));
    }

    #[test]
    fn test_reconcile_unopenable_file() {
        let tmp = TempDir::new().unwrap();
        let err =
            reconcile_file(&tmp.path().join("nope.csv"), &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, EnergyError::FileRead { .. }));
    }

    #[test]
    fn test_reconcile_custom_delimiter_and_timestamp_column() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(
            tmp.path(),
            "G_apr.csv",
            "read_at; usage\n2024-04-02 06:00:00;3.25\n",
        );
        let config = PipelineConfig {
            delimiter: b';',
            timestamp_column: "read_at".to_string(),
            ..PipelineConfig::default()
        };
        let file = reconcile_file(&path, &config).unwrap();
        assert_eq!(file.kwh_source, "usage");
        assert_eq!(
            file.rows[0].timestamp.date(),
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()
        );
    }

    #[test]
    fn test_reconcile_drops_rows_at_end_of_calendar() {
        let tmp = TempDir::new().unwrap();
        // +262142-12-31 is the last representable date and not a Sunday.
        let path = write_csv(
            tmp.path(),
            "H_dec.csv",
            "timestamp,kwh\n2024-12-30 00:00:00,2\n+262142-12-31,9\n",
        );

        let file = reconcile_file(&path, &PipelineConfig::default()).unwrap();
        assert_eq!(file.rows.len(), 1);
        assert_eq!(file.rows_skipped, 1);

        let config = PipelineConfig {
            week_anchor: NaiveDate::MAX.weekday(),
            ..PipelineConfig::default()
        };
        let file = reconcile_file(&path, &config).unwrap();
        assert_eq!(file.rows.len(), 2);
        assert_eq!(file.rows_skipped, 0);
    }

    // ── parse_quantity ────────────────────────────────────────────────────────

    #[test]
    fn test_parse_quantity_variants() {
        assert_eq!(parse_quantity(" 4.5 ").unwrap(), Some(4.5));
        assert_eq!(parse_quantity("").unwrap(), None);
        assert_eq!(parse_quantity("NaN").unwrap(), None);
        assert!(parse_quantity("inf").is_err());
        assert!(parse_quantity("-infinity").is_err());
        assert!(parse_quantity("12 kWh").is_err());
    }
}
