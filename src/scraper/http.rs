// src/scraper/http.rs

use crate::scraper::ScraperError;
use reqwest::blocking::Client;
use std::time::{Duration, Instant};
use tracing::debug;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

/// The one network primitive the adapters need: GET a URL, return the body.
pub trait Fetch {
    fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, ScraperError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, ScraperError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let resp = request
            .send()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScraperError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text()
            .map_err(|e| ScraperError::Network(e.to_string()))
    }
}

/// Keeps consecutive requests at least `interval` apart. The first call
/// waits the full interval too, so every request is preceded by a pause.
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn wait(&mut self) {
        let pause = match self.last {
            None => self.interval,
            Some(prev) => self.interval.saturating_sub(prev.elapsed()),
        };

        if !pause.is_zero() {
            debug!("Sleeping for {:?}", pause);
            std::thread::sleep(pause);
        }
        self.last = Some(Instant::now());
    }
}
