// src/domain/listing.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The listing provider a record came from.
/// The serialized name doubles as the namespace in the seen-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    OpenRent,
    SpareRoom,
}

impl Source {
    pub fn namespace(&self) -> &'static str {
        match self {
            Source::OpenRent => "openrent",
            Source::SpareRoom => "spareroom",
        }
    }

    pub fn listing_url(&self, id: &str) -> String {
        match self {
            Source::OpenRent => format!("https://www.openrent.co.uk/{id}"),
            Source::SpareRoom => format!("https://www.spareroom.co.uk/{id}"),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

/// Availability as scraped. Text the date parser could not make sense of
/// is kept verbatim so the stored record shows what the site said.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AvailableFrom {
    Date(NaiveDate),
    Text(String),
}

impl AvailableFrom {
    /// Resolved date, with unparsable text counting as `today`.
    pub fn date_or(&self, today: NaiveDate) -> NaiveDate {
        match self {
            AvailableFrom::Date(d) => *d,
            AvailableFrom::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").unwrap_or(today),
        }
    }
}

impl fmt::Display for AvailableFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailableFrom::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            AvailableFrom::Text(s) => f.write_str(s),
        }
    }
}

/// One nearby place and how long it takes to get there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nearby(pub String, pub String);

/// A rental listing after normalization. This is what gets written to the
/// detail store and what the filter and notifier work on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub source: Source,
    pub title: String,
    #[serde(default)]
    pub location: Vec<Nearby>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latlong: Option<String>,
    /// Monthly price. Only SpareRoom adverts can arrive without one.
    pub price: Option<f64>,
    pub description: String,
    pub available_from: AvailableFrom,
    #[serde(rename = "EPC")]
    pub epc_rating: Option<String>,
    pub has_garden: Option<bool>,
}
