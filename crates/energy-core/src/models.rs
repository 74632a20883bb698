use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column name every energy quantity is reconciled to.
pub const KWH_COLUMN: &str = "kwh";

/// Accepted substitutes for [`KWH_COLUMN`], in precedence order.
pub const KWH_ALIASES: &[&str] = &["energy", "usage", "units"];

/// One meter reading after schema reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    /// Zone-less timestamp of the reading.
    pub timestamp: NaiveDateTime,
    /// Energy quantity; `None` when the source cell was empty.
    pub kwh: Option<f64>,
    /// Building name taken from the first filename token.
    pub building: String,
    /// Month label taken from the last filename token.
    pub month: String,
}

impl CanonicalRow {
    /// The quantity, with a missing value counting as zero.
    pub fn kwh_or_zero(&self) -> f64 {
        self.kwh.unwrap_or(0.0)
    }
}

/// Building and month labels derived from a source file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub building: String,
    pub month: String,
}

impl FileMetadata {
    /// Split a file stem on `_`: the first token names the building, the last
    /// token names the month. A single-token stem fills both.
    pub fn from_stem(stem: &str) -> Self {
        let mut parts = stem.split('_');
        let building = parts.next().unwrap_or_default().to_string();
        let month = parts.last().map(str::to_string).unwrap_or_else(|| building.clone());
        Self { building, month }
    }
}

// ── Domain model ──────────────────────────────────────────────────────────────

/// A single timestamped energy reading owned by one [`Building`].
#[derive(Debug, Clone, PartialEq)]
pub struct MeterReading {
    timestamp: NaiveDateTime,
    kwh: Option<f64>,
}

impl MeterReading {
    pub fn new(timestamp: NaiveDateTime, kwh: Option<f64>) -> Self {
        Self { timestamp, kwh }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn kwh(&self) -> Option<f64> {
        self.kwh
    }
}

/// A named building and the readings recorded against it, in insertion order.
#[derive(Debug, Clone)]
pub struct Building {
    name: String,
    readings: Vec<MeterReading>,
}

impl Building {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn readings(&self) -> &[MeterReading] {
        &self.readings
    }

    pub fn add_reading(&mut self, reading: MeterReading) {
        self.readings.push(reading);
    }

    /// Sum of all reading quantities. Missing or non-finite values add zero.
    pub fn total_consumption(&self) -> f64 {
        self.readings
            .iter()
            .filter_map(|r| r.kwh)
            .filter(|v| v.is_finite())
            .sum()
    }

    /// `"<name>: Total Consumption = <total> kWh"`, total to two decimals.
    pub fn generate_report(&self) -> String {
        format!(
            "{}: Total Consumption = {:.2} kWh",
            self.name,
            self.total_consumption()
        )
    }
}

/// Per-run registry of buildings keyed by name.
///
/// Buildings are created on first sighting and iterated in creation order.
#[derive(Debug, Clone, Default)]
pub struct BuildingManager {
    buildings: Vec<Building>,
    index: HashMap<String, usize>,
}

impl BuildingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full object graph by calling [`add_record`](Self::add_record)
    /// once per row, in iteration order.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a CanonicalRow>) -> Self {
        let mut manager = Self::new();
        for row in rows {
            manager.add_record(&row.building, row.timestamp, row.kwh);
        }
        manager
    }

    /// Append a reading to `building`, creating the building if unseen.
    pub fn add_record(&mut self, building: &str, timestamp: NaiveDateTime, kwh: Option<f64>) {
        let idx = match self.index.get(building) {
            Some(&idx) => idx,
            None => {
                self.buildings.push(Building::new(building));
                let idx = self.buildings.len() - 1;
                self.index.insert(building.to_string(), idx);
                idx
            }
        };
        self.buildings[idx].add_reading(MeterReading::new(timestamp, kwh));
    }

    pub fn building(&self, name: &str) -> Option<&Building> {
        self.index.get(name).map(|&idx| &self.buildings[idx])
    }

    /// All buildings in creation order.
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// One report per building, in creation order.
    pub fn generate_all_reports(&self) -> Vec<String> {
        self.buildings.iter().map(Building::generate_report).collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
