// src/tests/utils.rs
use crate::config::Config;
use crate::domain::{Listing, Source};
use crate::notify::{BoardSink, ChatPost, ChatSink, Notifier, NotifyError};
use crate::scraper::{Fetch, ScraperError};
use crate::store::seen::SeenSet;
use crate::store::{DetailStore, SeenStore, StoreError};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

/// Fresh, empty directory for one test under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("rentwatch-tests")
        .join(std::process::id().to_string())
        .join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("cannot create {dir:?}: {e}"));
    dir
}

pub fn test_config() -> Config {
    Config::from_json(
        r#"{
            "slack_token": "xoxb-test",
            "trello_token": "tt",
            "trello_key": "tk",
            "trello_board": "b1",
            "work_addr1": "Old Street",
            "work_addr2": "Canary Wharf",
            "avail_from": "2024-04-01",
            "page_delay_ms": 0
        }"#,
    )
    .expect("test config parses")
}

/// Canned HTTP responses, matched on the end of the requested URL.
#[derive(Default)]
pub struct StubFetch {
    routes: Vec<(String, Result<String, u16>)>,
    pub requests: RefCell<Vec<String>>,
    pub headers_seen: RefCell<Vec<Vec<(String, String)>>>,
}

impl StubFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url_suffix: &str, body: impl Into<String>) -> Self {
        self.routes.push((url_suffix.to_string(), Ok(body.into())));
        self
    }

    pub fn with_status(mut self, url_suffix: &str, status: u16) -> Self {
        self.routes.push((url_suffix.to_string(), Err(status)));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requested(&self, url_suffix: &str) -> bool {
        self.requests.borrow().iter().any(|u| u.ends_with(url_suffix))
    }
}

impl Fetch for StubFetch {
    fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, ScraperError> {
        self.requests.borrow_mut().push(url.to_string());
        self.headers_seen.borrow_mut().push(
            headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );

        match self.routes.iter().find(|(suffix, _)| url.ends_with(suffix.as_str())) {
            Some((_, Ok(body))) => Ok(body.clone()),
            Some((_, Err(status))) => Err(ScraperError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(ScraperError::Network(format!("no stub for {url}"))),
        }
    }
}

#[derive(Default)]
pub struct MemorySeenStore {
    state: RefCell<Option<SeenSet>>,
    pub persists: Cell<usize>,
}

impl MemorySeenStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(source: &str, ids: &[&str]) -> Self {
        let mut seen = SeenSet::default();
        seen.merge(source, ids.iter().map(|s| s.to_string()));
        Self {
            state: RefCell::new(Some(seen)),
            persists: Cell::new(0),
        }
    }

    pub fn snapshot(&self) -> Option<SeenSet> {
        self.state.borrow().clone()
    }
}

impl SeenStore for MemorySeenStore {
    fn load(&self) -> Result<Option<SeenSet>, StoreError> {
        Ok(self.state.borrow().clone())
    }

    fn persist(&self, seen: &SeenSet) -> Result<(), StoreError> {
        *self.state.borrow_mut() = Some(seen.clone());
        self.persists.set(self.persists.get() + 1);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryDetailStore {
    records: RefCell<HashMap<(Source, String), Listing>>,
}

impl MemoryDetailStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn get(&self, source: Source, id: &str) -> Option<Listing> {
        self.records.borrow().get(&(source, id.to_string())).cloned()
    }
}

impl DetailStore for MemoryDetailStore {
    fn contains(&self, source: Source, id: &str) -> Result<bool, StoreError> {
        Ok(self.records.borrow().contains_key(&(source, id.to_string())))
    }

    fn insert_if_absent(&self, listing: &Listing) -> Result<bool, StoreError> {
        let mut records = self.records.borrow_mut();
        let key = (listing.source, listing.id.clone());
        if records.contains_key(&key) {
            return Ok(false);
        }
        records.insert(key, listing.clone());
        Ok(true)
    }
}

/// Chat sink that keeps what it was sent; optionally refuses everything.
pub struct RecordingChat {
    pub posts: Rc<RefCell<Vec<ChatPost>>>,
    pub fail: bool,
}

impl ChatSink for RecordingChat {
    fn post_message(&self, post: &ChatPost) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::ApiError("channel_not_found".into()));
        }
        self.posts.borrow_mut().push(post.clone());
        Ok(())
    }
}

pub struct RecordingBoard {
    pub cards: Rc<RefCell<Vec<(String, String)>>>,
}

impl BoardSink for RecordingBoard {
    fn create_card(&self, title: &str, description: &str) -> Result<(), NotifyError> {
        self.cards
            .borrow_mut()
            .push((title.to_string(), description.to_string()));
        Ok(())
    }
}

pub struct Outbox {
    pub posts: Rc<RefCell<Vec<ChatPost>>>,
    pub cards: Rc<RefCell<Vec<(String, String)>>>,
}

impl Outbox {
    pub fn sent(&self) -> usize {
        self.posts.borrow().len()
    }
}

/// A notifier wired to recording sinks, plus handles to inspect them.
pub fn recording_notifier(fail_chat: bool) -> (Notifier, Outbox) {
    let posts = Rc::new(RefCell::new(Vec::new()));
    let cards = Rc::new(RefCell::new(Vec::new()));
    let notifier = Notifier::new(
        Box::new(RecordingChat {
            posts: Rc::clone(&posts),
            fail: fail_chat,
        }),
        Box::new(RecordingBoard {
            cards: Rc::clone(&cards),
        }),
        "#general",
        ["Old Street".to_string(), "Canary Wharf".to_string()],
    );
    (notifier, Outbox { posts, cards })
}

pub fn search_results_html(ids: &[&str]) -> String {
    let links: String = ids
        .iter()
        .map(|id| format!(r#"<div class="listing"><a class="banda pt" href="/{id}">Flat {id}</a></div>"#))
        .collect();
    format!("<html><body><div id=\"results\">{links}<a href=\"/about\">About</a></div></body></html>")
}

/// A listing page with the structure the extractor expects.
pub fn listing_page_html(title: &str, price: &str, features: &[(&str, &str)]) -> String {
    let rows: String = features
        .iter()
        .map(|(label, value)| format!("<tr><td>{label}</td><td>{value}</td></tr>"))
        .collect();
    format!(
        r#"<html><body>
        <h1 class="propertyTitle"> {title} </h1>
        <h3 class="banda perMonthPrice">{price}</h3>
        <div class="well description hovertip">
            A bright flat close to the station.
        </div>
        <div id="Features">
            <table>{rows}
                <tr><td>Garden</td><td><i class="icon-ok"></i></td></tr>
                <tr><td>Pets Allowed</td><td><i class="icon-remove"></i></td></tr>
            </table>
        </div>
        <div id="LocalTransport">
            <table>
                <tr><th>Station</th><th>Distance</th></tr>
                <tr><td>Angel</td><td>6 min walk</td></tr>
                <tr><td>Old Street</td><td>12 min walk</td></tr>
            </table>
        </div>
        <input id="Latitude" type="hidden" value="51.532" />
        <input id="Longitude" type="hidden" value="-0.106" />
        </body></html>"#
    )
}
