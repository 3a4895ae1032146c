// src/scraper/openrent.rs
use crate::domain::Source;
use crate::scraper::{Discovered, Fetch, ListingSource, OpenRentPage, RawListing, ScraperError, SearchCriteria};
use scraper::{ElementRef, Html, Selector};
use tracing::info;
use url::Url;

const BASE_URL: &str = "http://www.openrent.co.uk";

/// OpenRent: one search results page per area, one HTML page per listing.
pub struct OpenRent<'a> {
    fetch: &'a dyn Fetch,
    criteria: SearchCriteria,
}

impl<'a> OpenRent<'a> {
    pub fn new(fetch: &'a dyn Fetch, criteria: SearchCriteria) -> Self {
        Self { fetch, criteria }
    }

    pub fn search_url(&self, area: &str) -> Result<String, ScraperError> {
        let url = Url::parse_with_params(
            &format!("{BASE_URL}/properties-to-rent/"),
            &[
                ("term", area.to_string()),
                ("within", self.criteria.radius.to_string()),
                ("prices_min", self.criteria.min_value.to_string()),
                ("prices_max", self.criteria.max_value.to_string()),
                ("bedrooms_min", "0".to_string()),
                ("bedrooms_max", "3".to_string()),
                ("isLive", "true".to_string()),
            ],
        )
        .map_err(|e| ScraperError::Network(format!("bad search url: {e}")))?;

        Ok(url.into())
    }

    /// Downloads and extracts one listing page.
    pub fn fetch_listing(&self, id: &str) -> Result<OpenRentPage, ScraperError> {
        info!("Processing property: {}", id);
        let html = self.fetch.get_text(&format!("{BASE_URL}/{id}"), &[])?;
        extract_page(id, &html)
    }
}

impl ListingSource for OpenRent<'_> {
    fn source(&self) -> Source {
        Source::OpenRent
    }

    fn list_current(&self, area: &str) -> Result<Vec<Discovered>, ScraperError> {
        let html = self.fetch.get_text(&self.search_url(area)?, &[])?;
        let ids = extract_listing_ids(&html)?;
        Ok(ids.into_iter().map(Discovered::id_only).collect())
    }

    fn fetch_raw(&self, found: &Discovered) -> Result<RawListing, ScraperError> {
        self.fetch_listing(&found.id).map(RawListing::OpenRent)
    }
}

fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::HtmlParse(format!("{css}: {e}")))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Listing ids linked from a search results page, in page order, without
/// duplicates.
pub fn extract_listing_ids(html: &str) -> Result<Vec<String>, ScraperError> {
    let document = Html::parse_document(html);
    let links = selector("a.banda.pt")?;

    let mut ids: Vec<String> = Vec::new();
    for href in document.select(&links).filter_map(|a| a.value().attr("href")) {
        let id = href.trim().trim_start_matches('/').to_string();
        if !id.is_empty() && !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Pulls the fields we care about out of a listing page. Nothing here is
/// required; the normalizer decides what is fatal.
pub fn extract_page(id: &str, html: &str) -> Result<OpenRentPage, ScraperError> {
    let document = Html::parse_document(html);

    let first_text = |css: &str| -> Result<Option<String>, ScraperError> {
        Ok(document.select(&selector(css)?).next().map(element_text))
    };
    let input_value = |css: &str| -> Result<Option<String>, ScraperError> {
        Ok(document
            .select(&selector(css)?)
            .next()
            .and_then(|el| el.value().attr("value"))
            .map(str::to_string))
    };

    let features = table_rows(&document, "div#Features table tr")?;
    let transport = table_rows(&document, "div#LocalTransport tr")?
        .into_iter()
        .skip(1)
        .collect();

    Ok(OpenRentPage {
        id: id.to_string(),
        title: first_text("h1.propertyTitle")?,
        price_text: first_text("h3.banda.perMonthPrice")?,
        description: first_text("div.well.description.hovertip")?,
        features,
        transport,
        latitude: input_value("input#Latitude")?,
        longitude: input_value("input#Longitude")?,
    })
}

// Rows keep their position (so a header can be skipped) but drop empty cells.
fn table_rows(document: &Html, row_css: &str) -> Result<Vec<Vec<String>>, ScraperError> {
    let rows = selector(row_css)?;
    let cells = selector("td")?;
    let tick = selector("i.icon-ok")?;
    let cross = selector("i.icon-remove")?;

    Ok(document
        .select(&rows)
        .map(|row| {
            row.select(&cells)
                .map(|cell| {
                    let text = element_text(cell);
                    if !text.is_empty() {
                        text
                    } else if cell.select(&tick).next().is_some() {
                        "yes".to_string()
                    } else if cell.select(&cross).next().is_some() {
                        "no".to_string()
                    } else {
                        text
                    }
                })
                .filter(|text| !text.is_empty())
                .collect()
        })
        .collect())
}
