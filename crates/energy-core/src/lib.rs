//! Core types for the campus energy pipeline.
//!
//! Holds the canonical row and building domain model, the error taxonomy,
//! configuration, timestamp parsing / bucketing helpers and number
//! formatting shared by the data, export and binary crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
