mod http;
mod models;
pub mod openrent;
mod scraper_error;
mod spareroom;

pub use http::{Fetch, HttpFetcher, Pacer};
pub use models::{OpenRentPage, RawListing, SearchPage, SpareRoomAdvert};
pub use openrent::OpenRent;
pub use scraper_error::ScraperError;
pub use spareroom::SpareRoom;

use crate::config::Config;
use crate::domain::Source;
use chrono::NaiveDate;

/// A listing id found by a search, plus the raw payload when the search
/// response already carried it.
#[derive(Debug, Clone)]
pub struct Discovered {
    pub id: String,
    pub prefetched: Option<RawListing>,
}

impl Discovered {
    pub fn id_only(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prefetched: None,
        }
    }
}

/// One external listings provider.
pub trait ListingSource {
    fn source(&self) -> Source;

    /// Everything currently listed for `area`. An error means nothing from
    /// this search should be trusted.
    fn list_current(&self, area: &str) -> Result<Vec<Discovered>, ScraperError>;

    /// Full raw payload for one discovered listing.
    fn fetch_raw(&self, found: &Discovered) -> Result<RawListing, ScraperError>;
}

/// Search parameters shared by both providers.
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub radius: u32,
    pub min_value: f64,
    pub max_value: f64,
    pub avail_from: NaiveDate,
}

impl SearchCriteria {
    pub fn from_config(config: &Config, today: NaiveDate) -> Self {
        Self {
            radius: config.radius,
            min_value: config.min_value,
            max_value: config.max_value,
            avail_from: config.avail_from_or(today),
        }
    }
}
