//! Array-methods walkthrough over a small restaurants file: display every
//! entry, filter the budget ones, map to names, and show how a failed load
//! is reported and recovered from.

use crate::error::LoadError;
use crate::loader::{load_json_array, DataSource};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

pub const NO_DATA: &str = "No data loaded yet";
pub const NO_MATCHES: &str = "No matching restaurants";

/// File name the error demo asks for; it is never expected to exist.
pub const MISSING_FILE: &str = "nonexistent-file.json";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Restaurant {
    pub name: String,
    pub cuisine: String,
    pub rating: f64,
    pub price_range: String,
    pub neighborhood: String,
    pub hours: String,
    pub phone_number: String,
}

impl Restaurant {
    /// Phone number reduced to digits, suitable for a `tel:` link.
    pub fn phone_digits(&self) -> String {
        self.phone_number.chars().filter(char::is_ascii_digit).collect()
    }
}

pub fn load_restaurants(path: &Path, timeout: Duration) -> Result<Vec<Restaurant>, LoadError> {
    let (restaurants, skipped) = load_json_array(&DataSource::File(path.to_path_buf()), timeout)?;
    info!(count = restaurants.len(), skipped, "restaurants loaded");
    Ok(restaurants)
}

pub fn display_lines(restaurants: &[Restaurant]) -> Vec<String> {
    if restaurants.is_empty() {
        return vec![NO_DATA.to_string()];
    }
    restaurants
        .iter()
        .map(|r| {
            format!(
                "{} | {} • {} • {} | Hours: {} | Rating: {:.1} | Phone: {} (tel:{})",
                r.name,
                r.cuisine,
                r.neighborhood,
                r.price_range,
                r.hours,
                r.rating,
                r.phone_number,
                r.phone_digits()
            )
        })
        .collect()
}

pub fn filter_budget(restaurants: &[Restaurant]) -> Vec<&Restaurant> {
    restaurants.iter().filter(|r| r.price_range == "$").collect()
}

pub fn map_names(restaurants: &[Restaurant]) -> Vec<&str> {
    restaurants.iter().map(|r| r.name.as_str()).collect()
}

/// Highest rating; the first one wins a tie.
pub fn top_rated(restaurants: &[Restaurant]) -> Option<&Restaurant> {
    restaurants.iter().fold(None, |best: Option<&Restaurant>, r| match best {
        Some(b) if r.rating <= b.rating => Some(b),
        _ => Some(r),
    })
}

/// Ask for a file next to `restaurants_path` that doesn't exist.
///
/// Returns the error it ran into (`None` only if someone created the file);
/// the caller shows it and offers to retry or to load the real data instead.
pub fn error_demo(restaurants_path: &Path, timeout: Duration) -> Option<LoadError> {
    let missing = restaurants_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(MISSING_FILE);
    match load_json_array::<Restaurant>(&DataSource::File(missing), timeout) {
        Ok(_) => None,
        Err(e) => {
            error!(error = %e, "demonstrated error");
            Some(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant(name: &str, price: &str, rating: f64) -> Restaurant {
        Restaurant {
            name: name.to_string(),
            cuisine: "Thai".to_string(),
            rating,
            price_range: price.to_string(),
            neighborhood: "Downtown".to_string(),
            hours: "11-9".to_string(),
            phone_number: "(301) 555-0199".to_string(),
        }
    }

    #[test]
    fn test_display_lines() {
        assert_eq!(display_lines(&[]), vec![NO_DATA.to_string()]);
        let lines = display_lines(&[restaurant("Basil", "$$", 4.5)]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Rating: 4.5"));
        assert!(lines[0].contains("tel:3015550199"));
    }

    #[test]
    fn test_filter_and_map() {
        let data = vec![
            restaurant("Basil", "$", 4.0),
            restaurant("Lemongrass", "$$", 4.8),
            restaurant("Pho Cheap", "$", 3.9),
        ];
        let budget: Vec<&str> = filter_budget(&data).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(budget, vec!["Basil", "Pho Cheap"]);
        assert_eq!(map_names(&data), vec!["Basil", "Lemongrass", "Pho Cheap"]);
    }

    #[test]
    fn test_top_rated_first_wins_ties() {
        let data = vec![
            restaurant("First", "$", 4.8),
            restaurant("Second", "$", 4.8),
            restaurant("Low", "$", 2.0),
        ];
        assert_eq!(top_rated(&data).map(|r| r.name.as_str()), Some("First"));
        assert_eq!(top_rated(&[]), None);
    }

    #[test]
    fn test_load_and_error_demo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restaurants.json");
        std::fs::write(
            &path,
            r#"[{"name": "Basil", "cuisine": "Thai", "rating": 4.5, "priceRange": "$",
                 "neighborhood": "Downtown", "hours": "11-9", "phoneNumber": "301-555-0100"}]"#,
        )
        .unwrap();

        let loaded = load_restaurants(&path, Duration::from_secs(1)).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].price_range, "$");

        let err = error_demo(&path, Duration::from_secs(1));
        assert!(matches!(err, Some(LoadError::Io { .. })));
    }
}
