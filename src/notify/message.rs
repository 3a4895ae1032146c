// src/notify/message.rs

use crate::domain::Listing;
use regex::Regex;
use std::sync::OnceLock;
use url::form_urlencoded;

const DESCRIPTION_LIMIT: usize = 1000;

/// Text for one listing, ready for both sinks.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub text: String,
    pub card_title: String,
}

fn slack_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(.+?)\|(.+?)>").expect("valid regex"))
}

fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("{p:.2}"),
        None => "unknown".to_string(),
    }
}

/// Google Maps public-transport directions between two places.
pub fn maps_link(start_addr: &str, end_addr: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("f", "d")
        .append_pair("saddr", start_addr)
        .append_pair("daddr", end_addr)
        .append_pair("dirflg", "r")
        .finish();
    format!("http://maps.google.co.uk/?{query}")
}

/// Start point for directions: the coordinates if known, otherwise the
/// address part of the title (everything after its first comma).
fn start_address(listing: &Listing) -> String {
    match &listing.latlong {
        Some(latlong) => latlong.clone(),
        None => listing
            .title
            .split_once(',')
            .map(|(_, rest)| rest.to_string())
            .unwrap_or_default(),
    }
}

pub fn directions(listing: &Listing, work_addrs: &[String; 2]) -> String {
    let start = start_address(listing);
    format!(
        "*Directions* 1: <{}|to {}> and 2: <{}|to {}>",
        maps_link(&start, &work_addrs[0]),
        work_addrs[0],
        maps_link(&start, &work_addrs[1]),
        work_addrs[1],
    )
}

pub fn compose(listing: &Listing, work_addrs: &[String; 2]) -> Message {
    let (place, duration) = listing
        .location
        .first()
        .map(|n| (n.0.as_str(), n.1.as_str()))
        .unwrap_or(("unknown", "unknown"));

    let price = format_price(listing.price);
    let epc = listing.epc_rating.as_deref().unwrap_or("None");
    let garden = if listing.has_garden == Some(true) {
        "With garden. "
    } else {
        ""
    };
    let description: String = listing.description.chars().take(DESCRIPTION_LIMIT).collect();

    let text = format!(
        "<{link}|{title}> close to {place} ({duration}):\n\
         *Price:* {price}. *Available from:* {available}. *EPC:* {epc}. {garden}\n\
         {directions}.\n*Description:*\n{description}",
        link = listing.source.listing_url(&listing.id),
        title = listing.title,
        available = listing.available_from,
        directions = directions(listing, work_addrs),
    );

    Message {
        text,
        card_title: format!("{} - {}", listing.title, price),
    }
}

/// Chat markup to board markdown: `<url|label>` becomes `[label](url)` and
/// single-star emphasis becomes double.
pub fn to_board_markdown(text: &str) -> String {
    slack_link()
        .replace_all(text, "[$2]($1)")
        .replace('*', "**")
}
