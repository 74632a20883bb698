//! Consumption aggregation over fixed-width time buckets and per building.
//!
//! Bucket sequences are dense: every day (or week) between the first and the
//! last reading is present, with empty buckets reported as zero.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use energy_core::models::CanonicalRow;
use energy_core::time_utils::Granularity;
use serde::Serialize;
use tracing::warn;

// ── BucketTotal ───────────────────────────────────────────────────────────────

/// Consumption inside one time bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketTotal {
    /// Bucket label: the day itself, or the last day of the week.
    pub bucket: NaiveDate,
    pub kwh: f64,
    /// Rows that fell into the bucket.
    pub readings: u32,
}

impl BucketTotal {
    fn empty(bucket: NaiveDate) -> Self {
        Self {
            bucket,
            kwh: 0.0,
            readings: 0,
        }
    }

    fn add_row(&mut self, row: &CanonicalRow) {
        self.kwh += row.kwh_or_zero();
        self.readings += 1;
    }
}

// ── SummaryStats ──────────────────────────────────────────────────────────────

/// Running min / max / sum over the present quantities of a building.
#[derive(Debug, Clone, Default)]
struct SummaryStats {
    min: Option<f64>,
    max: Option<f64>,
    sum: f64,
    present: u32,
    readings: u32,
}

impl SummaryStats {
    fn add(&mut self, kwh: Option<f64>) {
        self.readings += 1;
        let Some(v) = kwh else {
            return;
        };
        self.min = Some(self.min.map_or(v, |m| m.min(v)));
        self.max = Some(self.max.map_or(v, |m| m.max(v)));
        self.sum += v;
        self.present += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.present > 0).then(|| self.sum / self.present as f64)
    }
}

/// `min`, `max`, `mean` and `sum` of one building's quantities.
///
/// Missing quantities are skipped; a building with none present has no
/// min / max / mean and a zero sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingSummary {
    pub building: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub sum: f64,
    pub readings: u32,
}

// ── Campus-wide figures ───────────────────────────────────────────────────────

/// The single largest reading in the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakReading {
    pub timestamp: NaiveDateTime,
    pub building: String,
    pub kwh: f64,
}

/// Headline numbers for the campus summary report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampusTotals {
    pub total_kwh: f64,
    pub readings: usize,
    /// Building with the largest sum, with that sum.
    pub highest_building: Option<(String, f64)>,
    pub peak: Option<PeakReading>,
}

// ── EnergyAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that groups canonical rows by bucket or building.
pub struct EnergyAggregator;

impl EnergyAggregator {
    /// One bucket per calendar day from the first to the last reading.
    pub fn daily_totals(rows: &[CanonicalRow]) -> Vec<BucketTotal> {
        Self::aggregate(rows, Granularity::Daily)
    }

    /// One bucket per week ending on `anchor`, from the first to the last
    /// reading.
    pub fn weekly_totals(rows: &[CanonicalRow], anchor: Weekday) -> Vec<BucketTotal> {
        Self::aggregate(rows, Granularity::Weekly { anchor })
    }

    /// Bucket `rows` at `granularity`, then walk every bucket between the
    /// first and last one and zero-fill those without rows.
    ///
    /// Returns buckets in ascending order; empty input gives an empty vec.
    /// Rows whose bucket label lies past the end of the calendar are left
    /// out with a warning.
    pub fn aggregate(rows: &[CanonicalRow], granularity: Granularity) -> Vec<BucketTotal> {
        let mut filled: BTreeMap<NaiveDate, BucketTotal> = BTreeMap::new();
        for row in rows {
            let Some(bucket) = granularity.bucket_of(row.timestamp) else {
                warn!(
                    "No bucket for reading at {} ({}), leaving it out",
                    row.timestamp, row.building
                );
                continue;
            };
            filled
                .entry(bucket)
                .or_insert_with(|| BucketTotal::empty(bucket))
                .add_row(row);
        }

        let (Some(&first), Some(&last)) = (filled.keys().next(), filled.keys().next_back())
        else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut cursor = Some(first);
        while let Some(bucket) = cursor.filter(|b| *b <= last) {
            out.push(
                filled
                    .remove(&bucket)
                    .unwrap_or_else(|| BucketTotal::empty(bucket)),
            );
            cursor = granularity.next_bucket(bucket);
        }
        out
    }

    /// Per-building statistics in order of first appearance.
    pub fn building_summary(rows: &[CanonicalRow]) -> Vec<BuildingSummary> {
        let mut order: Vec<&str> = Vec::new();
        let mut stats: HashMap<&str, SummaryStats> = HashMap::new();

        for row in rows {
            let name = row.building.as_str();
            stats
                .entry(name)
                .or_insert_with(|| {
                    order.push(name);
                    SummaryStats::default()
                })
                .add(row.kwh);
        }

        order
            .into_iter()
            .map(|name| {
                let s = &stats[name];
                BuildingSummary {
                    building: name.to_string(),
                    min: s.min,
                    max: s.max,
                    mean: s.mean(),
                    sum: s.sum,
                    readings: s.readings,
                }
            })
            .collect()
    }

    /// Campus total, highest-consuming building and peak reading.
    ///
    /// Ties go to the earlier building in `summaries` and to the earlier row
    /// in `rows`.
    pub fn campus_totals(rows: &[CanonicalRow], summaries: &[BuildingSummary]) -> CampusTotals {
        let total_kwh = rows.iter().map(CanonicalRow::kwh_or_zero).sum();

        let highest_building = summaries
            .iter()
            .fold(None::<&BuildingSummary>, |best, s| match best {
                Some(b) if b.sum >= s.sum => Some(b),
                _ => Some(s),
            })
            .map(|s| (s.building.clone(), s.sum));

        let peak = rows
            .iter()
            .filter_map(|r| r.kwh.map(|v| (r, v)))
            .fold(None::<(&CanonicalRow, f64)>, |best, (r, v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((r, v)),
            })
            .map(|(r, v)| PeakReading {
                timestamp: r.timestamp,
                building: r.building.clone(),
                kwh: v,
            });

        CampusTotals {
            total_kwh,
            readings: rows.len(),
            highest_building,
            peak,
        }
    }

    /// Sum of the bucket totals.
    pub fn calculate_total(buckets: &[BucketTotal]) -> f64 {
        buckets.iter().map(|b| b.kwh).sum()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
