use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A listing as it came off the wire, tagged by where it came from.
/// Each variant has its own normalizer in `domain::normalize`.
#[derive(Debug, Clone)]
pub enum RawListing {
    OpenRent(OpenRentPage),
    SpareRoom(SpareRoomAdvert),
}

// OpenRent detail page, flattened out of the HTML
//  ├── h1.propertyTitle            -> title
//  ├── h3.banda.perMonthPrice      -> price_text
//  ├── div.description             -> description
//  ├── div#Features table rows     -> features
//  ├── div#LocalTransport rows     -> transport
//  └── input#Latitude / #Longitude -> latitude / longitude

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenRentPage {
    pub id: String,
    pub title: Option<String>,
    pub price_text: Option<String>,
    pub description: Option<String>,
    /// Non-empty cell texts of each feature table row, e.g. `["EPC Rating", "C"]`.
    pub features: Vec<Vec<String>>,
    pub transport: Vec<Vec<String>>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl OpenRentPage {
    /// Value cell of the first feature row labelled `label`.
    pub fn feature(&self, label: &str) -> Option<&str> {
        self.features
            .iter()
            .find(|row| row.first().map(String::as_str) == Some(label))
            .and_then(|row| row.get(1))
            .map(String::as_str)
    }
}

/// One advert summary from the SpareRoom search API. The API is loose about
/// types (ids and rents show up as both strings and numbers), so the
/// scalar fields are read as text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpareRoomAdvert {
    #[serde(deserialize_with = "de_text")]
    pub advert_id: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub min_rent: Option<String>,
    #[serde(default)]
    pub per: Option<String>,
    #[serde(default)]
    pub ad_title: Option<String>,
    #[serde(default)]
    pub ad_text_255: Option<String>,
    #[serde(default)]
    pub available_from: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub longitude: Option<String>,
}

/// One page of SpareRoom search results.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(deserialize_with = "de_count")]
    pub page: u32,
    #[serde(deserialize_with = "de_count")]
    pub pages: u32,
    #[serde(default)]
    pub results: Vec<SpareRoomAdvert>,
}

impl SearchPage {
    pub fn pages_left(&self) -> u32 {
        self.pages.saturating_sub(self.page)
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_text(value).ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_text))
}

fn de_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let text = de_text(deserializer)?;
    text.trim()
        .parse::<u32>()
        .map_err(|e| serde::de::Error::custom(format!("bad page count {text:?}: {e}")))
}
