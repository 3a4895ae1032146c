// src/config.rs

use chrono::{Duration as Days, Local, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings read once at startup and handed to each component.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub slack_token: String,
    pub trello_token: String,
    pub trello_key: String,
    pub trello_board: String,
    pub work_addr1: String,
    pub work_addr2: String,

    #[serde(default = "default_radius")]
    pub radius: u32,
    #[serde(default = "default_max_value")]
    pub max_value: f64,
    #[serde(default = "default_min_value")]
    pub min_value: f64,
    /// Earliest acceptable move-in date; `None` means the day of the run.
    #[serde(default)]
    pub avail_from: Option<NaiveDate>,
    #[serde(default = "default_delta_days")]
    pub delta_days: i64,

    #[serde(default = "default_slack_channel")]
    pub slack_channel: String,
    /// Saved SpareRoom searches keyed by area; used instead of a built query.
    #[serde(default)]
    pub spareroom_search_ids: BTreeMap<String, String>,
    /// Where `links.json` and the per-listing directories live.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
}

fn default_radius() -> u32 {
    20
}

fn default_max_value() -> f64 {
    1500.0
}

fn default_min_value() -> f64 {
    1000.0
}

fn default_delta_days() -> i64 {
    30
}

fn default_slack_channel() -> String {
    "#general".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_page_delay_ms() -> u64 {
    300
}

impl Config {
    /// Reads a JSON config file. A relative `data_dir` is taken relative to
    /// the directory holding the config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&text)?;

        if config.data_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.data_dir = parent.join(&config.data_dir);
            }
        }

        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_value > self.max_value {
            return Err(ConfigError::Invalid(format!(
                "min_value ({}) is above max_value ({})",
                self.min_value, self.max_value
            )));
        }
        if self.delta_days < 0 {
            return Err(ConfigError::Invalid("delta_days must not be negative".into()));
        }

        let start = self.avail_from.unwrap_or_else(|| Local::now().date_naive());
        let last = Days::try_days(self.delta_days).and_then(|w| start.checked_add_signed(w));
        if last.is_none() {
            return Err(ConfigError::Invalid(format!(
                "delta_days ({}) reaches past the last representable date",
                self.delta_days
            )));
        }
        Ok(())
    }

    /// Areas searched each run, in order.
    pub fn areas(&self) -> Vec<String> {
        vec![self.work_addr1.clone(), self.work_addr2.clone()]
    }

    pub fn work_addresses(&self) -> [String; 2] {
        [self.work_addr1.clone(), self.work_addr2.clone()]
    }

    pub fn avail_from_or(&self, today: NaiveDate) -> NaiveDate {
        self.avail_from.unwrap_or(today)
    }

    pub fn availability_window(&self) -> Days {
        Days::days(self.delta_days)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn seen_path(&self) -> PathBuf {
        self.data_dir.join("links.json")
    }
}
