// src/domain/normalize.rs

use crate::domain::dates::parse_natural_date;
use crate::domain::listing::{AvailableFrom, Listing, Nearby, Source};
use crate::scraper::{OpenRentPage, RawListing, SpareRoomAdvert};
use chrono::NaiveDate;
use thiserror::Error;

const WEEKS_PER_YEAR: f64 = 52.0;
const MONTHS_PER_YEAR: f64 = 12.0;
const SPAREROOM_DEFAULT_AVAILABILITY: &str = "2000-01-01";

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("listing {id}: missing required field `{field}`")]
    MissingField { id: String, field: &'static str },
    #[error("listing {id}: cannot read price from {text:?}")]
    BadPrice { id: String, text: String },
}

/// Turns a raw payload into the canonical `Listing`, dispatching on the source tag.
pub fn normalize(raw: RawListing, today: NaiveDate) -> Result<Listing, NormalizeError> {
    match raw {
        RawListing::OpenRent(page) => normalize_openrent(page, today),
        RawListing::SpareRoom(advert) => normalize_spareroom(advert),
    }
}

/// OpenRent pages must carry a title and a price; everything else is optional.
fn normalize_openrent(page: OpenRentPage, today: NaiveDate) -> Result<Listing, NormalizeError> {
    let id = page.id.clone();

    let title = page
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| NormalizeError::MissingField {
            id: id.clone(),
            field: "title",
        })?
        .to_string();

    let price_text = page.price_text.as_deref().ok_or_else(|| NormalizeError::MissingField {
        id: id.clone(),
        field: "price",
    })?;
    let price = parse_price(price_text).ok_or_else(|| NormalizeError::BadPrice {
        id: id.clone(),
        text: price_text.to_string(),
    })?;

    let available_from = match page.feature("Available From") {
        Some(text) => match parse_natural_date(text, today) {
            Some(date) => AvailableFrom::Date(date),
            None => AvailableFrom::Text(text.to_string()),
        },
        None => AvailableFrom::Date(today),
    };

    let has_garden = match page.feature("Garden") {
        Some("yes") => Some(true),
        Some("no") => Some(false),
        _ => None,
    };

    let latlong = match (&page.latitude, &page.longitude) {
        (Some(lat), Some(lon)) => Some(format!("{lat},{lon}")),
        _ => None,
    };

    let epc_rating = page.feature("EPC Rating").map(str::to_string);

    let location = page
        .transport
        .iter()
        .filter(|row| row.len() >= 2)
        .map(|row| Nearby(row[0].clone(), row[1].clone()))
        .collect();

    Ok(Listing {
        id,
        source: Source::OpenRent,
        title,
        location,
        latlong,
        price: Some(price),
        description: page.description.unwrap_or_default().replace('\t', ""),
        available_from,
        epc_rating,
        has_garden,
    })
}

/// SpareRoom summaries are loose: every field has a default and a missing
/// rent simply leaves the price unset.
fn normalize_spareroom(advert: SpareRoomAdvert) -> Result<Listing, NormalizeError> {
    let period = advert.per.as_deref().unwrap_or("pcm");
    let price = match advert.min_rent.as_deref() {
        Some(text) => {
            let rent = parse_price(text).ok_or_else(|| NormalizeError::BadPrice {
                id: advert.advert_id.clone(),
                text: text.to_string(),
            })?;
            Some(monthly_rent(rent, period))
        }
        None => None,
    };

    let description = advert
        .ad_text_255
        .unwrap_or_else(|| "No descriptions".to_string());
    let has_garden = description.contains("garden").then_some(true);

    let available_from = advert
        .available_from
        .unwrap_or_else(|| SPAREROOM_DEFAULT_AVAILABILITY.to_string());
    let available_from = match NaiveDate::parse_from_str(available_from.trim(), "%Y-%m-%d") {
        Ok(date) => AvailableFrom::Date(date),
        Err(_) => AvailableFrom::Text(available_from),
    };

    let latlong = match (&advert.latitude, &advert.longitude) {
        (Some(lat), Some(lon)) => Some(format!("{lat},{lon}")),
        _ => None,
    };

    Ok(Listing {
        id: advert.advert_id,
        source: Source::SpareRoom,
        title: advert.ad_title.unwrap_or_else(|| "no title".to_string()),
        location: Vec::new(),
        latlong,
        price,
        description,
        available_from,
        epc_rating: None,
        has_garden,
    })
}

/// Converts a rent quoted for `period` into a per-calendar-month amount.
/// Anything that is not "pcm" is treated as weekly.
pub fn monthly_rent(rent: f64, period: &str) -> f64 {
    if period == "pcm" {
        rent
    } else {
        rent * WEEKS_PER_YEAR / MONTHS_PER_YEAR
    }
}

/// Reads "£1,250" / "1250.50" style amounts.
pub fn parse_price(text: &str) -> Option<f64> {
    let digits: String = text
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit() && c != '.')
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();
    digits.parse::<f64>().ok()
}
