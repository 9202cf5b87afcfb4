use chrono::NaiveDate;
use inspection_report::config::ViewConfig;
use inspection_report::loader::{load_records, DataSource};
use inspection_report::output::{write_report, HTML_FILE};
use inspection_report::views::build_report;
use std::path::PathBuf;
use std::time::Duration;

fn demo_source() -> DataSource {
    DataSource::File(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/inspections.json"))
}

#[test]
fn demo_dataset_end_to_end() {
    let (records, load_report) = load_records(&demo_source(), Duration::from_secs(5)).unwrap();
    assert_eq!(load_report.loaded_rows, 7);
    assert_eq!(load_report.with_results, 6);
    assert_eq!(load_report.with_dates, 5);

    let now = NaiveDate::from_ymd_opt(2021, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let report = build_report(&records, &ViewConfig::default(), now);

    assert_eq!(report.table.matched, 3);
    assert_eq!(report.table.rows[1].zip, "20740");

    // "Non-Compliant" still contains "compliant".
    assert_eq!(report.stats.overall.compliant_count, 5);
    assert_eq!(report.stats.overall.critical_count, 1);
    assert_eq!(report.stats.overall.rate, 83.3);
    assert_eq!(report.stats.top_categories[0].key, "Restaurant");

    assert_eq!(report.cards.len(), 6);
    assert_eq!(report.cards[0].name, "Laurel Diner");

    let stores = &report.categories.groups[2];
    assert_eq!(stores.items.len(), 1);
    assert_eq!(stores.items[0].name, "Corner Market");

    let months: Vec<&str> = report.stats.monthly.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(months, vec!["2020-07", "2020-11", "2021-05"]);

    let dir = tempfile::tempdir().unwrap();
    write_report(dir.path(), &report).unwrap();
    let html = std::fs::read_to_string(dir.path().join(HTML_FILE)).unwrap();
    assert!(html.contains("Terrapin Grill"));
    assert!(html.contains(r#"id="trendLineChart""#));
}
