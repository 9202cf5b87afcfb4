//! Command-line interface argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Food inspection report generator.
///
/// Loads a food-inspection dataset (JSON array) and renders it as a table,
/// cards, category groups and statistics.
///
/// Examples:
///   inspection_report
///   inspection_report --batch --source ./inspections.json --output-dir out
///   inspection_report --batch --city Hyattsville --year 2021
///   inspection_report --tutorial ./restaurants.json
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Dataset location: an http(s) URL or a local JSON file
    #[arg(short, long, value_name = "URL|FILE", env = "INSPECTION_SOURCE")]
    pub source: Option<String>,

    /// Path to a TOML configuration file
    ///
    /// If not specified, looks for inspection_report.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory the HTML page, JSON summary and CSV table are written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// City used by the table, category and safety-score views
    #[arg(long, env = "INSPECTION_CITY")]
    pub city: Option<String>,

    /// Inspection year shown in the table view
    #[arg(long)]
    pub year: Option<i32>,

    /// Load attempts before giving up in batch mode
    #[arg(long, value_name = "COUNT")]
    pub retries: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Load, generate every view and exit without the menu
    #[arg(long, conflicts_with = "tutorial")]
    pub batch: bool,

    /// Run the array-methods tutorial against a restaurants JSON file
    #[arg(long, value_name = "FILE")]
    pub tutorial: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log level from verbosity flags; `RUST_LOG` still wins.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        let mut args = Args::default();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "inspection_report",
            "--batch",
            "--source",
            "data.json",
            "--year",
            "2021",
            "--city",
            "Laurel",
        ])
        .unwrap();
        assert!(args.batch);
        assert_eq!(args.source.as_deref(), Some("data.json"));
        assert_eq!(args.year, Some(2021));
        assert_eq!(args.city.as_deref(), Some("Laurel"));
    }

    #[test]
    fn test_batch_conflicts_with_tutorial() {
        let res = Args::try_parse_from([
            "inspection_report",
            "--batch",
            "--tutorial",
            "restaurants.json",
        ]);
        assert!(res.is_err());
    }
}
