use crate::render::render_page;
use crate::types::BucketRow;
use crate::util::format_number;
use crate::views::{DatasetOverview, RankedBucket, Report, StatsView};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub const HTML_FILE: &str = "report.html";
pub const SUMMARY_FILE: &str = "summary.json";
pub const TABLE_CSV_FILE: &str = "table_view.csv";

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[derive(Serialize)]
struct Summary<'a> {
    generated_at: String,
    stats: &'a StatsView,
    overview: &'a DatasetOverview,
}

/// Write the HTML page, JSON summary and CSV table into `dir`.
///
/// Returns the written paths in that order.
pub fn write_report(dir: &Path, report: &Report) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let html_path = dir.join(HTML_FILE);
    std::fs::write(&html_path, render_page(report))
        .with_context(|| format!("failed to write {}", html_path.display()))?;

    let summary_path = dir.join(SUMMARY_FILE);
    write_json(
        &summary_path,
        &Summary {
            generated_at: report.generated_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            stats: &report.stats,
            overview: &report.overview,
        },
    )?;

    let csv_path = dir.join(TABLE_CSV_FILE);
    write_csv(&csv_path, &report.table.rows)?;

    info!(dir = %dir.display(), "report written");
    Ok(vec![html_path, summary_path, csv_path])
}

pub fn bucket_rows(ranked: &[RankedBucket]) -> Vec<BucketRow> {
    ranked
        .iter()
        .map(|b| BucketRow {
            key: b.key.clone(),
            total: b.total,
            compliant: b.compliant,
            rate: format_number(b.rate, 1),
        })
        .collect()
}

/// Markdown table of the first `max_rows` rows, or `(no rows)`.
pub fn table_string<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", table_string(rows, max_rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::types::InspectionRecord;
    use crate::views::build_report;
    use chrono::NaiveDate;

    fn sample_report() -> Report {
        let records = vec![InspectionRecord {
            name: Some("Terrapin Grill".into()),
            category: Some("Restaurant".into()),
            city: Some("College Park".into()),
            zip: Some("20740".into()),
            inspection_date: Some("2020-06-01T00:00:00.000".into()),
            inspection_results: Some("Compliant".into()),
            ..Default::default()
        }];
        let now = NaiveDate::from_ymd_opt(2020, 12, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        build_report(&records, &ViewConfig::default(), now)
    }

    #[test]
    fn test_write_report_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let paths = write_report(&out, &sample_report()).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| p.exists()));

        let csv = std::fs::read_to_string(out.join(TABLE_CSV_FILE)).unwrap();
        assert!(csv.starts_with("Establishment Name,Category,City,Zip Code,Address,Inspection Date"));
        assert!(csv.contains("Terrapin Grill,Restaurant,College Park,20740,N/A,6/1/2020"));

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary["stats"]["overall"]["rate"], 100.0);
        assert_eq!(summary["overview"]["total_cities"], 1);
    }

    #[test]
    fn test_table_string() {
        let report = sample_report();
        let rows = bucket_rows(&report.stats.top_categories);
        let table = table_string(&rows, 5);
        assert!(table.contains("Restaurant"));
        assert!(table.contains("100.0"));
        assert_eq!(table_string::<BucketRow>(&[], 5), "(no rows)");
    }
}
