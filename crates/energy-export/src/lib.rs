//! Result export layer for the campus energy pipeline.
//!
//! Writes the unified dataset, daily / weekly totals and building summary as
//! CSV, plus a plain-text campus summary report.

pub mod export;
pub mod summary;

pub use energy_core as core;
pub use energy_data as data;
