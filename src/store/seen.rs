// src/store/seen.rs

use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Every listing id ever observed, per source namespace. Sets only grow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenSet {
    sources: BTreeMap<String, BTreeSet<String>>,
}

/// Result of comparing a fresh search against what was seen before.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeenDiff {
    /// Ids in the latest search that were never seen.
    pub new_ids: BTreeSet<String>,
    /// Previously seen ids plus the latest ones.
    pub merged: BTreeSet<String>,
}

impl SeenSet {
    #[cfg(test)]
    pub fn ids(&self, source: &str) -> Option<&BTreeSet<String>> {
        self.sources.get(source)
    }

    #[cfg(test)]
    pub fn contains(&self, source: &str, id: &str) -> bool {
        self.sources.get(source).is_some_and(|ids| ids.contains(id))
    }

    /// Compares `latest` with what `source` has seen, without changing anything.
    pub fn diff<I>(&self, source: &str, latest: I) -> SeenDiff
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let latest: BTreeSet<String> = latest.into_iter().map(Into::into).collect();
        let empty = BTreeSet::new();
        let previous = self.sources.get(source).unwrap_or(&empty);

        SeenDiff {
            new_ids: latest.difference(previous).cloned().collect(),
            merged: latest.union(previous).cloned().collect(),
        }
    }

    /// Adds `ids` to `source`. Other sources are left alone.
    pub fn merge<I>(&mut self, source: &str, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.sources.entry(source.to_string()).or_default().extend(ids);
    }

    /// `diff` followed by `merge`: the set now holds the latest ids too.
    pub fn diff_and_merge<I>(&mut self, source: &str, latest: I) -> SeenDiff
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let diff = self.diff(source, latest);
        self.merge(source, diff.merged.iter().cloned());
        diff
    }
}

/// Durable home of the seen-set.
pub trait SeenStore {
    /// `None` when nothing has ever been persisted (a first run).
    fn load(&self) -> Result<Option<SeenSet>, StoreError>;

    /// Replaces the stored record as a whole.
    fn persist(&self, seen: &SeenSet) -> Result<(), StoreError>;
}

/// The seen-set as a single pretty-printed JSON object:
/// `{ "openrent": ["id", ...], "spareroom": [...] }`.
pub struct JsonSeenStore {
    path: PathBuf,
}

impl JsonSeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SeenStore for JsonSeenStore {
    fn load(&self) -> Result<Option<SeenSet>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })
    }

    // Written to a sibling temp file and renamed over the old one, so a
    // crash leaves either the old snapshot or the new one.
    fn persist(&self, seen: &SeenSet) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let file = fs::File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, seen).map_err(|source| StoreError::Json {
            path: tmp.clone(),
            source,
        })?;
        writer
            .flush()
            .and_then(|_| writer.get_ref().sync_all())
            .map_err(|e| StoreError::io(&tmp, e))?;

        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))
    }
}
