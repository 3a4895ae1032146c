// src/store/details.rs

use crate::domain::{Listing, Source};
use crate::store::StoreError;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Per-listing records. A record, once written, is never replaced; its
/// presence is what marks a listing as fully processed.
pub trait DetailStore {
    fn contains(&self, source: Source, id: &str) -> Result<bool, StoreError>;

    /// Stores `listing` unless a record for it exists. Returns whether it was written.
    fn insert_if_absent(&self, listing: &Listing) -> Result<bool, StoreError>;
}

/// One JSON file per listing, named by id, in a directory per source.
pub struct FileDetailStore {
    root: PathBuf,
}

impl FileDetailStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn dir_for(&self, source: Source) -> PathBuf {
        match source {
            Source::OpenRent => self.root.join("properties"),
            Source::SpareRoom => self.root.join("properties_sr"),
        }
    }

    pub fn path_for(&self, source: Source, id: &str) -> Result<PathBuf, StoreError> {
        let usable = !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(&['/', '\\'][..])
            && !id.ends_with(".tmp");
        if !usable {
            return Err(StoreError::InvalidKey(id.to_string()));
        }
        Ok(self.dir_for(source).join(id))
    }
}

fn write_json(path: &Path, listing: &Listing) -> Result<(), StoreError> {
    let file = fs::File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, listing).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|e| StoreError::io(path, e))
}

impl DetailStore for FileDetailStore {
    fn contains(&self, source: Source, id: &str) -> Result<bool, StoreError> {
        Ok(self.path_for(source, id)?.is_file())
    }

    // The record is written in full to a temp file, then hard-linked into
    // place; linking fails if the target exists, which makes the insert
    // atomic and leaves an existing record untouched.
    fn insert_if_absent(&self, listing: &Listing) -> Result<bool, StoreError> {
        let path = self.path_for(listing.source, &listing.id)?;
        let dir = self.dir_for(listing.source);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        if path.exists() {
            return Ok(false);
        }

        let tmp = dir.join(format!("{}.{}.tmp", listing.id, std::process::id()));
        link_new(&tmp, &path, |tmp| write_json(tmp, listing))
    }
}

/// Runs `write` against `tmp`, then links it to `path` unless `path` exists.
/// The temp file is removed whether or not either step succeeded.
fn link_new<F>(tmp: &Path, path: &Path, write: F) -> Result<bool, StoreError>
where
    F: FnOnce(&Path) -> Result<(), StoreError>,
{
    let linked =
        write(tmp).and_then(|_| fs::hard_link(tmp, path).map_err(|e| StoreError::io(path, e)));
    remove_temp(tmp);

    match linked {
        Ok(()) => Ok(true),
        Err(StoreError::Io { source, .. }) if source.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

fn remove_temp(tmp: &Path) {
    match fs::remove_file(tmp) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove temp record {}: {}", tmp.display(), e),
    }
}
