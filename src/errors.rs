// errors.rs
use crate::notify::NotifyError;
use crate::scraper::ScraperError;
use crate::store::StoreError;
use thiserror::Error;

/// Anything that aborts one (source, area) pass. Per-listing fetch and
/// normalization problems never get this far; they are logged and skipped.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetching listings failed: {0}")]
    Scraper(#[from] ScraperError),
    #[error("storage failed: {0}")]
    Store(#[from] StoreError),
    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),
}
