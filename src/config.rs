//! Configuration file handling.
//!
//! Settings come from `inspection_report.toml` when present, and any value
//! given on the command line overrides the file.

use crate::cli::Args;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "inspection_report.toml";

/// PG County food inspection endpoint.
pub const DEFAULT_SOURCE: &str = "https://data.princegeorgescountymd.gov/resource/umjn-t2iz.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub source: String,
    pub output_dir: PathBuf,
    pub retries: u32,
    pub timeout_secs: u64,
    pub views: ViewConfig,
}

/// Filters and thresholds used when building the views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub city: String,
    pub table_year: i32,
    pub card_count: usize,
    pub top_categories: usize,
    pub top_cities: usize,
    pub min_city_inspections: usize,
    pub trend_months: u32,
    pub safest_min_total: usize,
    /// City safety score at or above which the stats view reports strong compliance.
    pub strong_compliance_pct: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            output_dir: PathBuf::from("."),
            retries: 3,
            timeout_secs: 30,
            views: ViewConfig::default(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            city: "College Park".to_string(),
            table_year: 2020,
            card_count: 6,
            top_categories: 6,
            top_cities: 5,
            min_city_inspections: 10,
            trend_months: 12,
            safest_min_total: 10,
            strong_compliance_pct: 70.0,
        }
    }
}

impl ReportConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Explicit `--config` must exist; the default file is optional.
    pub fn resolve(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.merge_with_args(args);
        Ok(config)
    }

    /// CLI arguments take precedence, but only when actually given.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(source) = &args.source {
            self.source = source.clone();
        }
        if let Some(dir) = &args.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(retries) = args.retries {
            self.retries = retries;
        }
        if let Some(timeout) = args.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(city) = &args.city {
            self.views.city = city.clone();
        }
        if let Some(year) = args.year {
            self.views.table_year = year;
        }
    }
}
