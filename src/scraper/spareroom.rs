// src/scraper/spareroom.rs
use crate::domain::Source;
use crate::scraper::{
    Discovered, Fetch, ListingSource, Pacer, RawListing, ScraperError, SearchCriteria, SearchPage,
    SpareRoomAdvert,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const API_URL: &str = "http://iphoneapp.spareroom.co.uk/flatshares";
const MAX_PER_PAGE: u32 = 100;

// The app API wants to see the mobile client and a session, any session.
const HEADERS: &[(&str, &str)] = &[
    ("User-Agent", "SpareRoomUK 3.1"),
    ("Cookie", "session_id=00000000; session_key=000000000000000"),
];

/// SpareRoom: a paginated JSON search whose results already hold
/// everything the normalizer needs, so there is no per-listing fetch.
pub struct SpareRoom<'a> {
    fetch: &'a dyn Fetch,
    criteria: SearchCriteria,
    search_ids: BTreeMap<String, String>,
    page_delay: Duration,
}

impl<'a> SpareRoom<'a> {
    pub fn new(
        fetch: &'a dyn Fetch,
        criteria: SearchCriteria,
        search_ids: BTreeMap<String, String>,
        page_delay: Duration,
    ) -> Self {
        Self {
            fetch,
            criteria,
            search_ids,
            page_delay,
        }
    }

    /// Query parameters for `area`, minus the page number.
    fn search_params(&self, area: &str) -> Vec<(&'static str, String)> {
        if let Some(search_id) = self.search_ids.get(area) {
            return vec![("format", "json".into()), ("search_id", search_id.clone())];
        }

        vec![
            ("format", "json".into()),
            ("max_rent", self.criteria.max_value.to_string()),
            ("per", "pcm".into()),
            ("max_per_page", MAX_PER_PAGE.to_string()),
            ("where", area.to_lowercase()),
            ("miles_from_max", self.criteria.radius.to_string()),
            ("posted_by", "private_landlords".into()),
            ("showme_1beds", "Y".into()),
            (
                "available_from",
                self.criteria.avail_from.format("%Y-%m-%d").to_string(),
            ),
        ]
    }

    /// Lazily walks the result pages for `area`.
    pub fn pages(&self, area: &str) -> SearchPages<'a> {
        SearchPages {
            fetch: self.fetch,
            params: self.search_params(area),
            next_page: 1,
            pacer: Pacer::new(self.page_delay),
            done: false,
        }
    }

    /// Every advert across all pages, or an error if any page failed.
    pub fn fetch_all(&self, area: &str) -> Result<Vec<SpareRoomAdvert>, ScraperError> {
        let mut adverts = Vec::new();
        for page in self.pages(area) {
            let page = page.inspect_err(|e| warn!("SpareRoom search for {} aborted: {}", area, e))?;
            debug!("Parsing page {}/{} flats in {}", page.page, page.pages, area);
            adverts.extend(page.results);
        }
        Ok(adverts)
    }
}

impl ListingSource for SpareRoom<'_> {
    fn source(&self) -> Source {
        Source::SpareRoom
    }

    fn list_current(&self, area: &str) -> Result<Vec<Discovered>, ScraperError> {
        let adverts = self.fetch_all(area)?;
        info!("SpareRoom returned {} adverts for {}", adverts.len(), area);

        Ok(adverts
            .into_iter()
            .map(|advert| Discovered {
                id: advert.advert_id.clone(),
                prefetched: Some(RawListing::SpareRoom(advert)),
            })
            .collect())
    }

    fn fetch_raw(&self, found: &Discovered) -> Result<RawListing, ScraperError> {
        match &found.prefetched {
            Some(raw @ RawListing::SpareRoom(_)) => Ok(raw.clone()),
            _ => Err(ScraperError::Network(format!(
                "SpareRoom advert {} has no search payload",
                found.id
            ))),
        }
    }
}

/// Iterator over search result pages. Requests are paced, and iteration
/// stops after the last page or the first failed one.
pub struct SearchPages<'a> {
    fetch: &'a dyn Fetch,
    params: Vec<(&'static str, String)>,
    next_page: u32,
    pacer: Pacer,
    done: bool,
}

impl SearchPages<'_> {
    fn page_url(&self) -> Result<String, ScraperError> {
        let page = self.next_page.to_string();
        let params = self
            .params
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .chain(std::iter::once(("page", page.as_str())));

        Url::parse_with_params(API_URL, params)
            .map(String::from)
            .map_err(|e| ScraperError::Network(format!("bad search url: {e}")))
    }

    fn fetch_page(&self) -> Result<SearchPage, ScraperError> {
        let url = self.page_url()?;
        let body = self.fetch.get_text(&url, HEADERS)?;
        serde_json::from_str(&body).map_err(|e| ScraperError::JsonParse(e.to_string()))
    }
}

impl Iterator for SearchPages<'_> {
    type Item = Result<SearchPage, ScraperError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.pacer.wait();
        let result = self.fetch_page();
        match &result {
            // the reported page number is not trusted to advance
            Ok(page) if page.pages_left() > 0 && self.next_page < page.pages => {
                self.next_page += 1
            }
            _ => self.done = true,
        }
        Some(result)
    }
}
