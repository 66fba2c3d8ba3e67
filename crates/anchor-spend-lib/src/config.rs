//! Per-platform run configuration, read from a JSON file.

use crate::calculator::MissingDataPolicy;
use crate::data_structures::DateRange;
use crate::error::{AttributionError, Result};
use crate::rounding::RoundingMethod;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRangeConfig {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputFilesConfig {
    pub schedule_file: PathBuf,
    pub expense_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFileConfig {
    pub filename: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeProcessingConfig {
    #[serde(default = "default_method")]
    pub method: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributionConfig {
    #[serde(default)]
    pub missing_data: MissingDataPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub date_range: DateRangeConfig,
    pub input_files: InputFilesConfig,
    pub output_file: OutputFileConfig,
    /// Overrides the top-level method for this platform.
    #[serde(default)]
    pub time_processing: Option<TimeProcessingConfig>,
    #[serde(default)]
    pub attribution: AttributionConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub time_processing: Option<TimeProcessingConfig>,
    #[serde(flatten)]
    pub platforms: BTreeMap<String, Value>,
}

/// Everything a single run needs, fully validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub platform: String,
    pub range: DateRange,
    pub schedule_file: PathBuf,
    pub expense_file: PathBuf,
    pub output_file: PathBuf,
    pub method: RoundingMethod,
    pub missing_data: MissingDataPolicy,
}

fn default_method() -> String {
    RoundingMethod::default().name().to_string()
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AttributionError::Configuration(format!(
                "cannot read configuration file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            AttributionError::Configuration(format!("invalid configuration file: {e}"))
        })
    }

    /// Platform sections are parsed on demand, so one broken section does not
    /// block runs for the others.
    pub fn platform(&self, name: &str) -> Result<PlatformConfig> {
        let section = self.platforms.get(name).ok_or_else(|| {
            AttributionError::Configuration(format!("no configuration section for platform '{name}'"))
        })?;

        PlatformConfig::deserialize(section).map_err(|e| {
            AttributionError::Configuration(format!("platform '{name}': {e}"))
        })
    }

    pub fn resolve(&self, name: &str) -> Result<RunSettings> {
        let platform = self.platform(name)?;

        let method = platform
            .time_processing
            .as_ref()
            .or(self.time_processing.as_ref())
            .map(|tp| tp.method.parse::<RoundingMethod>())
            .transpose()?
            .unwrap_or_default();

        let start = parse_date("date_range.start_date", &platform.date_range.start_date)?;
        let end = parse_date("date_range.end_date", &platform.date_range.end_date)?;

        Ok(RunSettings {
            platform: name.to_string(),
            range: DateRange::new(start, end)?,
            schedule_file: platform.input_files.schedule_file,
            expense_file: platform.input_files.expense_file,
            output_file: platform.output_file.filename,
            method,
            missing_data: platform.attribution.missing_data,
        })
    }
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        AttributionError::Configuration(format!("{key} '{value}' is not a YYYY-MM-DD date: {e}"))
    })
}
