// src/pipeline.rs

use crate::domain::{normalize, FilterPolicy, Listing};
use crate::errors::PipelineError;
use crate::notify::Notifier;
use crate::scraper::{Discovered, ListingSource};
use crate::store::{DetailStore, SeenStore, StoreError};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{error, info, info_span, warn};

/// Counts for one (source, area) pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub source: String,
    pub area: String,
    pub fetched: usize,
    pub new: usize,
    pub stored: usize,
    pub already_stored: usize,
    pub failed: usize,
    pub filtered: usize,
    pub notified: usize,
}

/// Drives discovery, dedup, storage and notification for each source and area.
pub struct Pipeline<'a> {
    seen: &'a dyn SeenStore,
    details: &'a dyn DetailStore,
    notifier: &'a Notifier,
    policy: &'a FilterPolicy,
    today: NaiveDate,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        seen: &'a dyn SeenStore,
        details: &'a dyn DetailStore,
        notifier: &'a Notifier,
        policy: &'a FilterPolicy,
        today: NaiveDate,
    ) -> Self {
        Self {
            seen,
            details,
            notifier,
            policy,
            today,
        }
    }

    /// Whether this invocation may notify. Without any stored seen-set this
    /// is a first run and everything found would look new, so it never does.
    pub fn notifications_allowed(&self, requested: bool) -> Result<bool, PipelineError> {
        if self.seen.load()?.is_none() {
            warn!(
                "No seen-set detected. This must be the first run: \
                 not notifying about any properties."
            );
            return Ok(false);
        }
        Ok(requested)
    }

    /// One pass over every area, each area trying every source in order.
    /// A failing pass is logged and the rest still run.
    pub fn run(
        &self,
        sources: &[&dyn ListingSource],
        areas: &[String],
        notify_requested: bool,
    ) -> Result<Vec<RunReport>, PipelineError> {
        let notify = self.notifications_allowed(notify_requested)?;
        let mut reports = Vec::new();

        for area in areas {
            for source in sources {
                match self.run_source(*source, area, notify) {
                    Ok(report) => reports.push(report),
                    Err(e) => error!("{} pass for {} failed: {}", source.source(), area, e),
                }
            }
        }
        Ok(reports)
    }

    /// Fetch, diff, process new listings, then record everything as seen.
    pub fn run_source(
        &self,
        source: &dyn ListingSource,
        area: &str,
        notify: bool,
    ) -> Result<RunReport, PipelineError> {
        let namespace = source.source().namespace();
        let _span = info_span!("pass", source = namespace, area).entered();

        let found = source.list_current(area)?;
        info!("Received {} property links...", found.len());

        // merged in memory only; written once the listings are handled
        let mut seen = self.seen.load()?.unwrap_or_default();
        let diff = seen.diff_and_merge(namespace, found.iter().map(|d| d.id.as_str()));
        info!("Found {} new links!...", diff.new_ids.len());

        let mut report = RunReport {
            source: namespace.to_string(),
            area: area.to_string(),
            fetched: found.len(),
            new: diff.new_ids.len(),
            ..Default::default()
        };

        let mut handled = HashSet::new();
        for item in found.iter().filter(|d| diff.new_ids.contains(&d.id)) {
            if handled.insert(item.id.as_str()) {
                self.process(source, item, notify, &mut report)?;
            }
        }

        self.seen.persist(&seen)?;

        info!(
            "Done: {} stored, {} already stored, {} failed, {} filtered, {} notified",
            report.stored, report.already_stored, report.failed, report.filtered, report.notified
        );
        Ok(report)
    }

    fn process(
        &self,
        source: &dyn ListingSource,
        item: &Discovered,
        notify: bool,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        let Some(exists) = usable_key(self.details.contains(source.source(), &item.id), report)?
        else {
            return Ok(());
        };
        if exists {
            info!("Skipping {} as it already exists", item.id);
            report.already_stored += 1;
            return Ok(());
        }

        let raw = match source.fetch_raw(item) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Problem fetching {}: {}", item.id, e);
                report.failed += 1;
                return Ok(());
            }
        };

        let listing = match normalize(raw, self.today) {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Problem parsing {}: {}", item.id, e);
                report.failed += 1;
                return Ok(());
            }
        };

        let Some(written) = usable_key(self.details.insert_if_absent(&listing), report)? else {
            return Ok(());
        };
        if !written {
            info!("Skipping {} as it already exists", item.id);
            report.already_stored += 1;
            return Ok(());
        }
        report.stored += 1;

        if notify {
            self.notify(&listing, report)
        } else {
            info!(
                "Found a property {} but notifications are disabled.",
                listing.id
            );
            Ok(())
        }
    }

    fn notify(&self, listing: &Listing, report: &mut RunReport) -> Result<(), PipelineError> {
        let decision = self.policy.should_notify(listing, self.today);
        if !decision.notify {
            info!("Skipping notification for {}: {}", listing.id, decision.reason);
            report.filtered += 1;
            return Ok(());
        }

        self.notifier.notify(listing)?;
        report.notified += 1;
        Ok(())
    }
}

/// An id the detail store cannot key on fails that listing alone; any other
/// store error is passed up.
fn usable_key(
    result: Result<bool, StoreError>,
    report: &mut RunReport,
) -> Result<Option<bool>, PipelineError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::InvalidKey(id)) => {
            warn!("Cannot store listing {:?}: unusable record key", id);
            report.failed += 1;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
