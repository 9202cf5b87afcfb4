use crate::util::{contains_ci, parse_date_safe};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tabled::Tabled;

/// One row of the food-inspection dataset.
///
/// Every field is optional. Real exports mix strings and numbers (zip codes
/// in particular), so each field is read leniently and an empty string is
/// treated the same as a missing one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InspectionRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(
        default,
        rename = "address_line_1",
        alias = "address",
        deserialize_with = "lenient_string"
    )]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub zip: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub inspection_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub inspection_results: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

impl InspectionRecord {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    /// Result text, if the inspection produced one.
    pub fn results(&self) -> Option<&str> {
        self.inspection_results.as_deref()
    }

    pub fn is_compliant(&self) -> bool {
        self.results().is_some_and(|r| contains_ci(r, "compliant"))
    }

    pub fn is_critical(&self) -> bool {
        self.results().is_some_and(|r| contains_ci(r, "critical"))
    }

    /// `None` both when the date is absent and when it cannot be parsed.
    pub fn inspected_at(&self) -> Option<NaiveDateTime> {
        parse_date_safe(self.inspection_date.as_deref())
    }

    pub fn in_city(&self, city: &str) -> bool {
        self.city
            .as_deref()
            .is_some_and(|c| c.to_lowercase() == city.to_lowercase())
    }
}

/// A `{total, compliant}` pair for one group key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub total: usize,
    pub compliant: usize,
}

impl Bucket {
    /// Count `record` if it carries a result; records without one leave the
    /// bucket untouched.
    pub fn add(&mut self, record: &InspectionRecord) {
        if record.results().is_some() {
            self.total += 1;
            if record.is_compliant() {
                self.compliant += 1;
            }
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.compliant as f64 / self.total as f64
        }
    }
}

/// Buckets keyed by a derived field, in first-occurrence order.
pub type Groups = IndexMap<String, Bucket>;

/// Whether a single inspection passed, failed critically, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Compliant,
    Critical,
    Other,
}

impl ResultStatus {
    pub fn of(record: &InspectionRecord) -> Self {
        if record.is_compliant() {
            ResultStatus::Compliant
        } else if record.is_critical() {
            ResultStatus::Critical
        } else {
            ResultStatus::Other
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ResultStatus::Compliant => "✓",
            ResultStatus::Critical => "⚠️",
            ResultStatus::Other => "○",
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TableRow {
    #[serde(rename = "Establishment Name")]
    #[tabled(rename = "Establishment Name")]
    pub name: String,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "City")]
    #[tabled(rename = "City")]
    pub city: String,
    #[serde(rename = "Zip Code")]
    #[tabled(rename = "Zip Code")]
    pub zip: String,
    #[serde(rename = "Address")]
    #[tabled(rename = "Address")]
    pub address: String,
    #[serde(rename = "Inspection Date")]
    #[tabled(rename = "Inspection Date")]
    pub inspection_date: String,
}

/// Preview row for any keyed bucket (category, city or month).
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BucketRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Inspections")]
    pub total: usize,
    #[tabled(rename = "Compliant")]
    pub compliant: usize,
    #[tabled(rename = "Rate (%)")]
    pub rate: String,
}
