use chrono::Weekday;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EnergyError, Result};
use crate::time_utils::parse_week_anchor;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Reconcile per-building energy meter exports and summarise consumption
#[derive(Parser, Debug, Clone)]
#[command(
    name = "campus-energy",
    about = "Reconcile per-building energy meter exports and summarise consumption",
    version
)]
pub struct Settings {
    /// Directory containing the meter export files
    #[arg(long, default_value = "data", env = "CAMPUS_ENERGY_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Directory the result files are written to
    #[arg(long, default_value = "output", env = "CAMPUS_ENERGY_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// File extension of the meter exports
    #[arg(long, default_value = "csv")]
    pub extension: String,

    /// Field delimiter of the meter exports
    #[arg(long, default_value = ",")]
    pub delimiter: String,

    /// Name of the timestamp column
    #[arg(long, default_value = "timestamp")]
    pub timestamp_column: String,

    /// Weekday each weekly bucket ends on
    #[arg(long, default_value = "sun", value_parser = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"])]
    pub week_anchor: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// JSON file with default values for the options above
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Skip writing result files; only print the building reports
    #[arg(long)]
    pub no_export: bool,
}

// ── ConfigFile ─────────────────────────────────────────────────────────────────

/// Optional JSON configuration; every key mirrors a CLI flag.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(default, rename_all = "snake_case")]
pub struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl ConfigFile {
    /// Load a config file from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| EnergyError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

// ── PipelineConfig ─────────────────────────────────────────────────────────────

/// Validated configuration handed to one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Extension without the leading dot.
    pub extension: String,
    pub delimiter: u8,
    pub timestamp_column: String,
    pub week_anchor: Weekday,
    pub export: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            extension: "csv".to_string(),
            delimiter: b',',
            timestamp_column: "timestamp".to_string(),
            week_anchor: Weekday::Sun,
            export: true,
        }
    }
}

impl PipelineConfig {
    /// Default configuration reading from `data_dir`.
    pub fn for_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse process arguments and merge the optional config file.
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args_os().collect())
    }

    /// Same as [`load`](Self::load) but with an explicit argument list.
    ///
    /// Values from `--config` fill in every option that was not given on the
    /// command line; the command line always wins.
    pub fn load_from_args(args: Vec<std::ffi::OsString>) -> Result<Self> {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if let Some(path) = settings.config.clone() {
            let file = ConfigFile::load_from(&path)?;
            settings.merge_config_file(file, &matches);
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        Ok(settings)
    }

    fn merge_config_file(&mut self, file: ConfigFile, matches: &clap::ArgMatches) {
        // clap stores the arg id using the field name, not the flag spelling.
        if !is_arg_explicitly_set(matches, "data_dir") {
            if let Some(v) = file.data_dir {
                self.data_dir = v;
            }
        }
        if !is_arg_explicitly_set(matches, "output_dir") {
            if let Some(v) = file.output_dir {
                self.output_dir = v;
            }
        }
        if !is_arg_explicitly_set(matches, "extension") {
            if let Some(v) = file.extension {
                self.extension = v;
            }
        }
        if !is_arg_explicitly_set(matches, "delimiter") {
            if let Some(v) = file.delimiter {
                self.delimiter = v;
            }
        }
        if !is_arg_explicitly_set(matches, "timestamp_column") {
            if let Some(v) = file.timestamp_column {
                self.timestamp_column = v;
            }
        }
        if !is_arg_explicitly_set(matches, "week_anchor") {
            if let Some(v) = file.week_anchor {
                self.week_anchor = v;
            }
        }
        if !is_arg_explicitly_set(matches, "log_level") {
            if let Some(v) = file.log_level {
                self.log_level = v;
            }
        }
        if self.log_file.is_none() {
            self.log_file = file.log_file;
        }
    }

    /// Validate the settings and build the configuration for one run.
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig> {
        let extension = self.extension.trim_start_matches('.').to_string();
        if extension.is_empty() {
            return Err(EnergyError::Config("extension must not be empty".into()));
        }

        let delimiter = match self.delimiter.as_str() {
            "\\t" | "tab" => b'\t',
            d if d.len() == 1 && d.is_ascii() => d.as_bytes()[0],
            other => {
                return Err(EnergyError::Config(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    other
                )))
            }
        };

        if self.timestamp_column.trim().is_empty() {
            return Err(EnergyError::Config(
                "timestamp column must not be empty".into(),
            ));
        }

        Ok(PipelineConfig {
            data_dir: self.data_dir.clone(),
            output_dir: self.output_dir.clone(),
            extension,
            delimiter,
            timestamp_column: self.timestamp_column.trim().to_string(),
            week_anchor: parse_week_anchor(&self.week_anchor)?,
            export: !self.no_export,
        })
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
