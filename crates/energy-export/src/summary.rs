//! Plain-text campus summary report.

use std::fmt::Write as _;
use std::path::Path;

use energy_core::error::{EnergyError, Result};
use energy_core::formatting::{format_kwh, format_number, format_optional, percentage};
use energy_core::time_utils::{week_anchor_name, TIMESTAMP_FORMAT};
use energy_data::analysis::PipelineReport;

/// Render the campus summary: headline totals, peak load, run statistics and
/// a per-building table.
pub fn render_summary(report: &PipelineReport) -> String {
    let totals = &report.totals;
    let meta = &report.metadata;
    let mut out = String::new();

    out.push_str("CAMPUS ENERGY SUMMARY REPORT\n");
    out.push_str("----------------------------\n\n");

    let _ = writeln!(
        out,
        "Total Campus Consumption: {}",
        format_kwh(totals.total_kwh)
    );

    match &totals.highest_building {
        Some((name, sum)) => {
            let _ = writeln!(
                out,
                "Highest Consuming Building: {} ({}, {}% of campus)",
                name,
                format_kwh(*sum),
                percentage(*sum, totals.total_kwh, 1)
            );
        }
        None => out.push_str("Highest Consuming Building: n/a\n"),
    }

    match &totals.peak {
        Some(peak) => {
            let _ = writeln!(
                out,
                "Peak Load Time: {} ({}, {})",
                peak.timestamp.format(TIMESTAMP_FORMAT),
                peak.building,
                format_kwh(peak.kwh)
            );
        }
        None => out.push_str("Peak Load Time: n/a\n"),
    }

    out.push('\n');
    let _ = writeln!(
        out,
        "Files loaded: {} ({} failed)",
        meta.files_loaded, meta.files_failed
    );
    let _ = writeln!(
        out,
        "Rows merged: {} ({} skipped)",
        meta.rows_merged, meta.rows_skipped
    );
    let _ = writeln!(
        out,
        "Daily buckets: {}, weekly buckets (weeks ending {}): {}",
        report.daily.len(),
        week_anchor_name(report.week_anchor),
        report.weekly.len()
    );
    let _ = writeln!(out, "Generated at: {}", meta.generated_at);

    out.push('\n');
    let _ = writeln!(
        out,
        "{:<16} {:>12} {:>12} {:>12} {:>14}",
        "Building", "Min", "Max", "Mean", "Total kWh"
    );
    for s in &report.building_summary {
        let _ = writeln!(
            out,
            "{:<16} {:>12} {:>12} {:>12} {:>14}",
            s.building,
            format_optional(s.min),
            format_optional(s.max),
            format_optional(s.mean),
            format_number(s.sum, 2)
        );
    }

    out
}

/// Write [`render_summary`] to `path`.
pub fn write_summary(report: &PipelineReport, path: &Path) -> Result<()> {
    std::fs::write(path, render_summary(report)).map_err(|source| EnergyError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}
