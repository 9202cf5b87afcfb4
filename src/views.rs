//! View models for the four presentations of the dataset.
//!
//! Each builder turns records into plain data; nothing here knows about
//! markup. `render` turns these into HTML and `output` into previews.

use crate::config::ViewConfig;
use crate::stats::{self, OverallCompliance, UNKNOWN_KEY};
use crate::types::{Bucket, InspectionRecord, ResultStatus, TableRow};
use crate::util::{contains_ci, format_us_date, round1};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    pub city: String,
    pub year: i32,
    pub matched: usize,
    pub total: usize,
    pub rows: Vec<TableRow>,
}

/// Records inspected in `cfg.table_year` in `cfg.city`, one row each.
pub fn table_view(records: &[InspectionRecord], cfg: &ViewConfig) -> TableView {
    let rows: Vec<TableRow> = records
        .iter()
        .filter(|r| r.in_city(&cfg.city))
        .filter(|r| r.inspected_at().is_some_and(|d| d.year() == cfg.table_year))
        .map(|r| TableRow {
            name: r.display_name().to_string(),
            category: or_na(r.category.as_deref()),
            city: or_na(r.city.as_deref()),
            zip: or_na(r.zip.as_deref()),
            address: or_na(r.address.as_deref()),
            inspection_date: format_us_date(r.inspection_date.as_deref()),
        })
        .collect();
    TableView {
        city: cfg.city.clone(),
        year: cfg.table_year,
        matched: rows.len(),
        total: records.len(),
        rows,
    }
}

fn or_na(s: Option<&str>) -> String {
    s.unwrap_or("N/A").to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub name: String,
    pub category: String,
    pub city: String,
    pub results: String,
    pub status: ResultStatus,
    pub inspection_date: String,
}

/// The `cfg.card_count` most recently inspected establishments.
///
/// Records whose date is present but unreadable sort after every real date.
pub fn card_view(records: &[InspectionRecord], cfg: &ViewConfig) -> Vec<Card> {
    let mut dated: Vec<(Option<NaiveDateTime>, &InspectionRecord)> = records
        .iter()
        .filter(|r| r.inspection_date.is_some())
        .map(|r| (r.inspected_at(), r))
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    dated
        .into_iter()
        .take(cfg.card_count)
        .map(|(_, r)| Card {
            name: r.display_name().to_string(),
            category: or_na(r.category.as_deref()),
            city: or_na(r.city.as_deref()),
            results: or_na(r.results()),
            status: ResultStatus::of(r),
            inspection_date: format_us_date(r.inspection_date.as_deref()),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryItem {
    pub name: String,
    pub inspection_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup {
    pub id: &'static str,
    pub icon: &'static str,
    pub title: &'static str,
    pub empty_message: &'static str,
    pub items: Vec<CategoryItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub city: String,
    pub groups: Vec<CategoryGroup>,
}

struct GroupSpec {
    id: &'static str,
    icon: &'static str,
    title: &'static str,
    empty_message: &'static str,
    needles: &'static [&'static str],
}

const CATEGORY_GROUPS: &[GroupSpec] = &[
    GroupSpec {
        id: "restaurants",
        icon: "🍽️",
        title: "Compliant Restaurants",
        empty_message: "No compliant restaurants found",
        needles: &["restaurant"],
    },
    GroupSpec {
        id: "fastfood",
        icon: "🍔",
        title: "Compliant Fast Food Chains",
        empty_message: "No compliant fast food chains found",
        needles: &["fast food"],
    },
    GroupSpec {
        id: "stores",
        icon: "🏪",
        title: "Compliant Convenience Stores",
        empty_message: "No compliant convenience stores found",
        needles: &["convenience", "store"],
    },
];

/// Compliant establishments in `cfg.city`, split into fixed category groups.
///
/// Groups are matched independently, so one record may show up in several.
pub fn category_view(records: &[InspectionRecord], cfg: &ViewConfig) -> CategoryView {
    let compliant: Vec<&InspectionRecord> = records
        .iter()
        .filter(|r| r.in_city(&cfg.city) && r.is_compliant())
        .collect();

    let groups = CATEGORY_GROUPS
        .iter()
        .map(|spec| {
            let items = compliant
                .iter()
                .filter(|r| {
                    let category = r.category.as_deref().unwrap_or("");
                    spec.needles.iter().any(|n| contains_ci(category, n))
                })
                .map(|r| CategoryItem {
                    name: r.display_name().to_string(),
                    inspection_date: format_us_date(r.inspection_date.as_deref()),
                })
                .collect();
            CategoryGroup {
                id: spec.id,
                icon: spec.icon,
                title: spec.title,
                empty_message: spec.empty_message,
                items,
            }
        })
        .collect();

    CategoryView {
        city: cfg.city.clone(),
        groups,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedBucket {
    pub key: String,
    pub total: usize,
    pub compliant: usize,
    pub rate: f64,
}

impl From<(String, Bucket)> for RankedBucket {
    fn from((key, bucket): (String, Bucket)) -> Self {
        Self {
            key,
            total: bucket.total,
            compliant: bucket.compliant,
            rate: stats::compliance_rate(&bucket),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPoint {
    pub month: String,
    /// Short label such as `Jun 24`.
    pub label: String,
    pub total: usize,
    pub compliant: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafestCategory {
    pub category: String,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsView {
    pub overall: OverallCompliance,
    pub city: String,
    pub city_inspections: usize,
    pub city_rate: f64,
    pub strong_compliance: bool,
    pub tip: String,
    pub top_categories: Vec<RankedBucket>,
    pub top_cities: Vec<RankedBucket>,
    pub monthly: Vec<MonthPoint>,
    pub safest_category: Option<SafestCategory>,
}

pub fn stats_view(records: &[InspectionRecord], cfg: &ViewConfig, now: NaiveDateTime) -> StatsView {
    let city_bucket = stats::city_compliance(records, &cfg.city);
    let city_rate = stats::compliance_rate(&city_bucket);
    let strong_compliance = city_rate >= cfg.strong_compliance_pct;
    let tip = if strong_compliance {
        format!("{} shows strong food safety compliance!", cfg.city)
    } else {
        "Exercise caution and check recent inspection results.".to_string()
    };

    let categories = stats::group_by_category(records);
    let cities = stats::group_by_city(records);

    StatsView {
        overall: stats::overall_compliance(records),
        city: cfg.city.clone(),
        city_inspections: city_bucket.total,
        city_rate,
        strong_compliance,
        tip,
        top_categories: stats::top_n(&categories, cfg.top_categories, 0)
            .into_iter()
            .map(RankedBucket::from)
            .collect(),
        top_cities: stats::top_n(&cities, cfg.top_cities, cfg.min_city_inspections)
            .into_iter()
            .map(RankedBucket::from)
            .collect(),
        monthly: stats::monthly_trend(records, cfg.trend_months, now)
            .into_iter()
            .map(|(month, bucket)| MonthPoint {
                label: month_label(&month),
                total: bucket.total,
                compliant: bucket.compliant,
                rate: stats::compliance_rate(&bucket),
                month,
            })
            .collect(),
        safest_category: stats::safest_category(&categories, cfg.safest_min_total)
            .map(|(category, rate)| SafestCategory { category, rate }),
    }
}

fn month_label(key: &str) -> String {
    NaiveDate::parse_from_str(&format!("{}-01", key), "%Y-%m-%d")
        .map(|d| d.format("%b %y").to_string())
        .unwrap_or_else(|_| key.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyCount {
    pub key: String,
    pub count: usize,
}

/// Dataset-wide counts that don't depend on inspection results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub total_records: usize,
    pub total_cities: usize,
    pub avg_per_city: f64,
    pub most_common_category: Option<KeyCount>,
    pub least_common_category: Option<KeyCount>,
    pub most_active_year: Option<KeyCount>,
    pub midpoint_year: Option<i32>,
    pub early_records: usize,
    pub recent_records: usize,
}

pub fn dataset_overview(records: &[InspectionRecord]) -> DatasetOverview {
    let cities: HashSet<&str> = records.iter().filter_map(|r| r.city.as_deref()).collect();
    let avg_per_city = if cities.is_empty() {
        0.0
    } else {
        round1(records.len() as f64 / cities.len() as f64)
    };

    let mut category_counts: IndexMap<&str, usize> = IndexMap::new();
    for r in records {
        *category_counts
            .entry(r.category.as_deref().unwrap_or(UNKNOWN_KEY))
            .or_default() += 1;
    }
    let mut by_count: Vec<(&str, usize)> = category_counts.into_iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(&a.1));
    let as_key_count = |(key, count): &(&str, usize)| KeyCount {
        key: key.to_string(),
        count: *count,
    };

    // BTreeMap keeps years ascending, so the earliest year wins count ties.
    let mut years: BTreeMap<i32, usize> = BTreeMap::new();
    for r in records {
        if let Some(at) = r.inspected_at() {
            *years.entry(at.year()).or_default() += 1;
        }
    }
    let mut most_active: Option<(i32, usize)> = None;
    for (&year, &count) in &years {
        if most_active.map_or(true, |(_, best)| count > best) {
            most_active = Some((year, count));
        }
    }

    let midpoint_year = match (years.keys().next(), years.keys().next_back()) {
        (Some(&min), Some(&max)) => Some((min + max).div_euclid(2)),
        _ => None,
    };
    let (early_records, recent_records) = match midpoint_year {
        Some(mid) => years.iter().fold((0, 0), |(early, recent), (&y, &c)| {
            if y <= mid {
                (early + c, recent)
            } else {
                (early, recent + c)
            }
        }),
        None => (0, 0),
    };

    DatasetOverview {
        total_records: records.len(),
        total_cities: cities.len(),
        avg_per_city,
        most_common_category: by_count.first().map(as_key_count),
        least_common_category: by_count.last().map(as_key_count),
        most_active_year: most_active.map(|(year, count)| KeyCount {
            key: year.to_string(),
            count,
        }),
        midpoint_year,
        early_records,
        recent_records,
    }
}

/// Everything the report page and the JSON summary are built from.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: NaiveDateTime,
    pub table: TableView,
    pub cards: Vec<Card>,
    pub categories: CategoryView,
    pub stats: StatsView,
    pub overview: DatasetOverview,
}

pub fn build_report(records: &[InspectionRecord], cfg: &ViewConfig, now: NaiveDateTime) -> Report {
    Report {
        generated_at: now,
        table: table_view(records, cfg),
        cards: card_view(records, cfg),
        categories: category_view(records, cfg),
        stats: stats_view(records, cfg, now),
        overview: dataset_overview(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(
        name: &str,
        city: &str,
        category: &str,
        date: &str,
        results: &str,
    ) -> InspectionRecord {
        InspectionRecord {
            name: Some(name.to_string()),
            city: Some(city.to_string()),
            category: Some(category.to_string()),
            inspection_date: Some(date.to_string()),
            inspection_results: Some(results.to_string()),
            ..Default::default()
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 12, 31)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap()
    }

    fn sample() -> Vec<InspectionRecord> {
        vec![
            rec("Terrapin Grill", "College Park", "Restaurant", "2020-03-04T00:00:00.000", "Compliant"),
            rec("Burger Hut", "college park", "Fast Food - Chain", "2020-07-19T00:00:00.000", "Compliant - No Health Risk"),
            rec("Quick Stop", "College Park", "Convenience Store", "2019-11-02T00:00:00.000", "Critical Violations observed"),
            rec("Corner Market", "College Park", "Grocery Store", "2020-01-15T00:00:00.000", "Compliant"),
            rec("Laurel Diner", "Laurel", "Restaurant", "2020-05-05T00:00:00.000", "Compliant"),
            rec("Mystery", "Laurel", "Restaurant", "not-a-date", "Closed"),
        ]
    }

    #[test]
    fn test_table_view_filters_city_and_year() {
        let view = table_view(&sample(), &ViewConfig::default());
        assert_eq!(view.total, 6);
        assert_eq!(view.matched, 3);
        let names: Vec<&str> = view.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Terrapin Grill", "Burger Hut", "Corner Market"]);
        assert_eq!(view.rows[0].inspection_date, "3/4/2020");
        assert_eq!(view.rows[0].zip, "N/A");
    }

    #[test]
    fn test_table_view_no_results() {
        let cfg = ViewConfig {
            table_year: 1999,
            ..Default::default()
        };
        let view = table_view(&sample(), &cfg);
        assert_eq!(view.matched, 0);
        assert!(view.rows.is_empty());
    }

    #[test]
    fn test_card_view_newest_first() {
        let cfg = ViewConfig {
            card_count: 3,
            ..Default::default()
        };
        let mut records = sample();
        records.push(InspectionRecord {
            name: Some("Undated".into()),
            ..Default::default()
        });
        let cards = card_view(&records, &cfg);
        let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Burger Hut", "Laurel Diner", "Terrapin Grill"]);
        assert_eq!(cards[0].status, ResultStatus::Compliant);

        let all = card_view(&records, &ViewConfig { card_count: 10, ..Default::default() });
        assert_eq!(all.len(), 6);
        assert_eq!(all.last().map(|c| c.name.as_str()), Some("Mystery"));
        assert_eq!(all.last().map(|c| c.inspection_date.as_str()), Some("N/A"));
    }

    #[test]
    fn test_category_view_groups() {
        let view = category_view(&sample(), &ViewConfig::default());
        let counts: Vec<(&str, usize)> = view.groups.iter().map(|g| (g.id, g.items.len())).collect();
        // Quick Stop is critical, so only Corner Market lands in stores.
        assert_eq!(counts, vec![("restaurants", 1), ("fastfood", 1), ("stores", 1)]);
        assert_eq!(view.groups[2].items[0].name, "Corner Market");
    }

    #[test]
    fn test_stats_view() {
        let view = stats_view(&sample(), &ViewConfig::default(), now());
        assert_eq!(view.overall.total_with_results, 6);
        assert_eq!(view.overall.compliant_count, 4);
        assert_eq!(view.city_inspections, 4);
        assert_eq!(view.city_rate, 75.0);
        assert!(view.strong_compliance);
        assert!(view.tip.starts_with("College Park"));
        assert_eq!(view.top_categories[0].key, "Restaurant");
        assert_eq!(view.top_categories[0].total, 3);
        // No city reaches ten inspections.
        assert!(view.top_cities.is_empty());
        assert!(view.safest_category.is_none());
        let months: Vec<&str> = view.monthly.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2020-01", "2020-03", "2020-05", "2020-07"]);
        assert_eq!(view.monthly[0].label, "Jan 20");
    }

    #[test]
    fn test_dataset_overview() {
        let overview = dataset_overview(&sample());
        assert_eq!(overview.total_cities, 3);
        assert_eq!(overview.avg_per_city, 2.0);
        assert_eq!(
            overview.most_common_category,
            Some(KeyCount { key: "Restaurant".into(), count: 3 })
        );
        assert_eq!(
            overview.least_common_category,
            Some(KeyCount { key: "Grocery Store".into(), count: 1 })
        );
        assert_eq!(
            overview.most_active_year,
            Some(KeyCount { key: "2020".into(), count: 4 })
        );
        assert_eq!(overview.midpoint_year, Some(2019));
        assert_eq!((overview.early_records, overview.recent_records), (1, 4));
    }

    #[test]
    fn test_dataset_overview_empty() {
        let overview = dataset_overview(&[]);
        assert_eq!(overview.total_cities, 0);
        assert_eq!(overview.avg_per_city, 0.0);
        assert_eq!(overview.most_common_category, None);
        assert_eq!(overview.most_active_year, None);
        assert_eq!(overview.midpoint_year, None);
    }
}
