use crate::error::LoadError;
use crate::types::InspectionRecord;
use reqwest::header::CACHE_CONTROL;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            DataSource::Url(s.to_string())
        } else {
            DataSource::File(PathBuf::from(s))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => write!(f, "{}", url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
    pub with_results: usize,
    pub with_dates: usize,
}

fn read_body(source: &DataSource, timeout: Duration) -> Result<String, LoadError> {
    match source {
        DataSource::Url(url) => {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()?;
            let response = client.get(url).header(CACHE_CONTROL, "no-store").send()?;
            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Status(status.as_u16()));
            }
            Ok(response.text()?)
        }
        DataSource::File(path) => std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        }),
    }
}

/// Decode `body` as a JSON array, keeping the object elements that fit `T`.
///
/// Returns the decoded items and how many elements were skipped. Non-object
/// elements are skipped without decoding.
pub fn parse_json_array<T: DeserializeOwned>(body: &str) -> Result<(Vec<T>, usize), LoadError> {
    let Value::Array(items) = serde_json::from_str::<Value>(body)? else {
        return Err(LoadError::NotArray);
    };
    let mut out = Vec::with_capacity(items.len());
    let mut skipped = 0usize;
    for (idx, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            debug!(index = idx, "skipping non-object element");
            skipped += 1;
            continue;
        }
        match serde_json::from_value::<T>(item) {
            Ok(v) => out.push(v),
            Err(e) => {
                debug!(index = idx, error = %e, "skipping malformed element");
                skipped += 1;
            }
        }
    }
    Ok((out, skipped))
}

pub fn load_json_array<T: DeserializeOwned>(
    source: &DataSource,
    timeout: Duration,
) -> Result<(Vec<T>, usize), LoadError> {
    info!(%source, "fetching data");
    let body = read_body(source, timeout)?;
    parse_json_array(&body)
}

pub fn load_records(
    source: &DataSource,
    timeout: Duration,
) -> Result<(Vec<InspectionRecord>, LoadReport), LoadError> {
    let (records, skipped_rows) = load_json_array::<InspectionRecord>(source, timeout)?;
    let report = summarize(&records, skipped_rows);
    info!(
        loaded = report.loaded_rows,
        skipped = report.skipped_rows,
        "data loaded"
    );
    Ok((records, report))
}

fn summarize(records: &[InspectionRecord], skipped_rows: usize) -> LoadReport {
    LoadReport {
        total_rows: records.len() + skipped_rows,
        loaded_rows: records.len(),
        skipped_rows,
        with_results: records.iter().filter(|r| r.results().is_some()).count(),
        with_dates: records.iter().filter(|r| r.inspected_at().is_some()).count(),
    }
}

/// Try `load_records` up to `attempts` times, sleeping `delay` in between.
///
/// The last error is returned if every attempt fails.
pub fn load_with_retry(
    source: &DataSource,
    attempts: u32,
    delay: Duration,
    timeout: Duration,
) -> Result<(Vec<InspectionRecord>, LoadReport), LoadError> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match load_records(source, timeout) {
            Ok(loaded) => return Ok(loaded),
            Err(e) if attempt < attempts => {
                warn!(attempt, attempts, error = %e, "load failed, retrying");
                thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
