//! Aggregation over inspection records.
//!
//! Every function here is pure: maps are rebuilt from the input slice on each
//! call and missing fields degrade to a default or drop out of a
//! denominator. Nothing in this module can fail.

use crate::types::{Bucket, Groups, InspectionRecord};
use crate::util::{percent, round1};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Group key used when the extracted field is absent.
pub const UNKNOWN_KEY: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OverallCompliance {
    pub rate: f64,
    pub critical_rate: f64,
    pub compliant_count: usize,
    pub critical_count: usize,
    pub other_count: usize,
    pub total_with_results: usize,
}

pub fn overall_compliance(records: &[InspectionRecord]) -> OverallCompliance {
    let mut compliant_count = 0usize;
    let mut critical_count = 0usize;
    let mut total_with_results = 0usize;

    for r in records.iter().filter(|r| r.results().is_some()) {
        total_with_results += 1;
        if r.is_compliant() {
            compliant_count += 1;
        }
        if r.is_critical() {
            critical_count += 1;
        }
    }

    OverallCompliance {
        rate: percent(compliant_count, total_with_results),
        critical_rate: percent(critical_count, total_with_results),
        compliant_count,
        critical_count,
        // A result can mention both tokens, so this can't go through plain subtraction.
        other_count: total_with_results
            .saturating_sub(compliant_count)
            .saturating_sub(critical_count),
        total_with_results,
    }
}

/// Bucket records by the field `key_fn` extracts, in first-occurrence order.
pub fn group_by_key<F>(records: &[InspectionRecord], key_fn: F) -> Groups
where
    F: Fn(&InspectionRecord) -> Option<&str>,
{
    let mut groups = Groups::new();
    for r in records {
        let key = key_fn(r).unwrap_or(UNKNOWN_KEY);
        // Avoid allocating the key for groups we've already seen.
        match groups.get_mut(key) {
            Some(bucket) => bucket.add(r),
            None => {
                let mut bucket = Bucket::default();
                bucket.add(r);
                groups.insert(key.to_string(), bucket);
            }
        }
    }
    groups
}

pub fn group_by_category(records: &[InspectionRecord]) -> Groups {
    group_by_key(records, |r| r.category.as_deref())
}

pub fn group_by_city(records: &[InspectionRecord]) -> Groups {
    group_by_key(records, |r| r.city.as_deref())
}

/// Largest groups first, dropping those under `min_total`.
///
/// The sort is stable, so groups with equal totals stay in insertion order.
pub fn top_n(groups: &Groups, n: usize, min_total: usize) -> Vec<(String, Bucket)> {
    let mut ranked: Vec<(String, Bucket)> = groups
        .iter()
        .filter(|(_, b)| b.total >= min_total)
        .map(|(k, b)| (k.clone(), *b))
        .collect();
    ranked.sort_by(|a, b| b.1.total.cmp(&a.1.total));
    ranked.truncate(n);
    ranked
}

/// Month-by-month buckets for the trailing `window_months`, current month
/// included, keyed `YYYY-MM` and returned oldest first.
///
/// The window opens on the first day of the earliest month and closes at
/// `now`, so inspections dated in the future are left out.
pub fn monthly_trend(
    records: &[InspectionRecord],
    window_months: u32,
    now: NaiveDateTime,
) -> Vec<(String, Bucket)> {
    let Some(start) = window_start(now, window_months) else {
        return Vec::new();
    };

    let mut months: BTreeMap<String, Bucket> = BTreeMap::new();
    let mut skipped = 0usize;
    for r in records {
        let Some(at) = r.inspected_at() else {
            skipped += 1;
            continue;
        };
        if at < start || at > now {
            continue;
        }
        let key = format!("{:04}-{:02}", at.year(), at.month());
        months.entry(key).or_default().add(r);
    }
    debug!(skipped, months = months.len(), "built monthly trend");

    months.into_iter().collect()
}

fn window_start(now: NaiveDateTime, window_months: u32) -> Option<NaiveDateTime> {
    if window_months == 0 {
        return None;
    }
    // Windows reaching past the calendar's start cover everything before now.
    let first = now.date().with_day(1)?;
    first
        .checked_sub_months(Months::new(window_months - 1))
        .unwrap_or(NaiveDate::MIN)
        .and_hms_opt(0, 0, 0)
}

/// Group with the best compliant/total ratio among those with at least
/// `min_total` inspections, as `(key, rate %)`.
///
/// Only a strictly better ratio replaces the current pick, so on ties the
/// group that came first wins.
pub fn safest_category(groups: &Groups, min_total: usize) -> Option<(String, f64)> {
    let mut best: Option<(&String, f64)> = None;
    for (key, bucket) in groups.iter().filter(|(_, b)| b.total >= min_total) {
        let ratio = bucket.ratio();
        let better = match best {
            None => true,
            Some((_, current)) => ratio > current,
        };
        if better {
            best = Some((key, ratio));
        }
    }
    best.map(|(key, ratio)| (key.clone(), round1(ratio * 100.0)))
}

/// The bucket for one city, matched case-insensitively on the full name.
pub fn city_compliance(records: &[InspectionRecord], city: &str) -> Bucket {
    let mut bucket = Bucket::default();
    for r in records.iter().filter(|r| r.in_city(city)) {
        bucket.add(r);
    }
    bucket
}

/// One-decimal compliance percentage for a bucket.
pub fn compliance_rate(bucket: &Bucket) -> f64 {
    percent(bucket.compliant, bucket.total)
}
