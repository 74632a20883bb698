//! Data ingestion layer for the campus energy pipeline.
//!
//! Responsible for discovering meter export files, reconciling their
//! heterogeneous schemas, merging them into one dataset, aggregating
//! consumption and running the top-level pipeline.

pub mod aggregator;
pub mod analysis;
pub mod dataset;
pub mod reader;
pub mod schema;

pub use energy_core as core;
