// src/domain/filter.rs

use crate::config::Config;
use crate::domain::listing::Listing;
use chrono::{Duration, NaiveDate};

/// Text OpenRent leaves in the description once a property has been let.
pub const DELISTED_MARKER: &str = "Note: This OpenRent Property Is No Longer Available For Rent";

const LOW_EPC_RATINGS: &[&str] = &["E", "F", "G"];

/// Outcome of running a listing through the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub notify: bool,
    /// Why the listing was rejected; empty when accepted.
    pub reason: String,
}

impl Decision {
    fn accept() -> Self {
        Self {
            notify: true,
            reason: String::new(),
        }
    }

    fn reject(reason: impl Into<String>) -> Self {
        Self {
            notify: false,
            reason: reason.into(),
        }
    }
}

/// The user's criteria for a listing worth hearing about.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    pub max_value: f64,
    pub min_value: f64,
    pub avail_from: NaiveDate,
    pub window: Duration,
}

impl FilterPolicy {
    pub fn from_config(config: &Config, today: NaiveDate) -> Self {
        Self {
            max_value: config.max_value,
            min_value: config.min_value,
            avail_from: config.avail_from_or(today),
            window: config.availability_window(),
        }
    }

    /// Checks the rules in a fixed order and reports the first one that fails.
    /// Availability text that is not a date counts as `today`.
    pub fn should_notify(&self, listing: &Listing, today: NaiveDate) -> Decision {
        let Some(price) = listing.price else {
            return Decision::reject("price unknown");
        };

        if price > self.max_value {
            return Decision::reject(format!("too expensive: {price} > {}", self.max_value));
        }
        if price < self.min_value {
            return Decision::reject(format!("too cheap: {price} < {}", self.min_value));
        }

        if listing.description.contains(DELISTED_MARKER) {
            return Decision::reject("already let");
        }

        if listing.description.to_lowercase().contains("shared flat")
            || listing.title.to_lowercase().contains("shared flat")
        {
            return Decision::reject("shared flat");
        }

        if let Some(epc) = listing.epc_rating.as_deref() {
            let epc = epc.trim().to_uppercase();
            if LOW_EPC_RATINGS.contains(&epc.as_str()) {
                return Decision::reject(format!("EPC is too low: {epc}"));
            }
        }

        let available = listing.available_from.date_or(today);
        if available < self.avail_from {
            return Decision::reject(format!(
                "available date ({}) is too early",
                available.format("%Y-%m-%d")
            ));
        }
        // a window running past the calendar has no upper bound
        let latest = self.avail_from.checked_add_signed(self.window);
        if latest.is_some_and(|latest| available > latest) {
            return Decision::reject(format!(
                "available date ({}) is too late",
                available.format("%Y-%m-%d")
            ));
        }

        Decision::accept()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::{AvailableFrom, Source};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        ymd(2024, 3, 10)
    }

    fn policy() -> FilterPolicy {
        FilterPolicy {
            max_value: 1500.0,
            min_value: 1000.0,
            avail_from: ymd(2024, 4, 1),
            window: Duration::days(30),
        }
    }

    fn listing() -> Listing {
        Listing {
            id: "1".to_string(),
            source: Source::OpenRent,
            title: "2 Bed Flat, Hackney".to_string(),
            location: Vec::new(),
            latlong: None,
            price: Some(1200.0),
            description: "Lovely two bed".to_string(),
            available_from: AvailableFrom::Date(ymd(2024, 4, 10)),
            epc_rating: Some("C".to_string()),
            has_garden: None,
        }
    }

    fn reason(listing: &Listing) -> String {
        policy().should_notify(listing, today()).reason
    }

    #[test]
    fn accepts_listing_within_criteria() {
        let decision = policy().should_notify(&listing(), today());
        assert!(decision.notify);
        assert_eq!(decision.reason, "");
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let mut at_max = listing();
        at_max.price = Some(1500.0);
        assert!(policy().should_notify(&at_max, today()).notify);

        let mut at_min = listing();
        at_min.price = Some(1000.0);
        assert!(policy().should_notify(&at_min, today()).notify);
    }

    #[test]
    fn price_rules() {
        let mut pricey = listing();
        pricey.price = Some(1600.0);
        assert_eq!(reason(&pricey), "too expensive: 1600 > 1500");

        let mut cheap = listing();
        cheap.price = Some(999.5);
        assert_eq!(reason(&cheap), "too cheap: 999.5 < 1000");

        let mut unknown = listing();
        unknown.price = None;
        assert_eq!(reason(&unknown), "price unknown");
    }

    #[test]
    fn first_failing_rule_wins() {
        let mut both = listing();
        both.price = Some(2000.0);
        both.epc_rating = Some("F".to_string());
        both.description = format!("shared flat. {DELISTED_MARKER}");
        assert!(reason(&both).starts_with("too expensive"));

        let mut let_and_shared = listing();
        let_and_shared.description = format!("Shared Flat. {DELISTED_MARKER}");
        assert_eq!(reason(&let_and_shared), "already let");
    }

    #[test]
    fn shared_flat_in_title_or_description() {
        let mut in_title = listing();
        in_title.title = "Room in SHARED FLAT".to_string();
        assert_eq!(reason(&in_title), "shared flat");

        let mut in_desc = listing();
        in_desc.description = "A room in a shared flat".to_string();
        assert_eq!(reason(&in_desc), "shared flat");
    }

    #[test]
    fn low_epc_is_rejected_case_insensitively() {
        for rating in ["e", "F", "g"] {
            let mut poor = listing();
            poor.epc_rating = Some(rating.to_string());
            assert_eq!(
                reason(&poor),
                format!("EPC is too low: {}", rating.to_uppercase())
            );
        }

        let mut d = listing();
        d.epc_rating = Some("D".to_string());
        assert!(policy().should_notify(&d, today()).notify);
    }

    #[test]
    fn availability_window() {
        let mut early = listing();
        early.available_from = AvailableFrom::Date(ymd(2024, 3, 31));
        assert_eq!(reason(&early), "available date (2024-03-31) is too early");

        let mut late = listing();
        late.available_from = AvailableFrom::Date(ymd(2024, 5, 2));
        assert_eq!(reason(&late), "available date (2024-05-02) is too late");

        let mut last_day = listing();
        last_day.available_from = AvailableFrom::Date(ymd(2024, 5, 1));
        assert!(policy().should_notify(&last_day, today()).notify);
    }

    #[test]
    fn window_past_the_calendar_has_no_upper_bound() {
        let endless = FilterPolicy {
            window: Duration::days(100_000_000),
            ..policy()
        };
        let mut far = listing();
        far.available_from = AvailableFrom::Date(ymd(9999, 12, 31));

        assert!(endless.should_notify(&far, today()).notify);
    }

    #[test]
    fn unparsable_availability_counts_as_today() {
        let mut vague = listing();
        vague.available_from = AvailableFrom::Text("ask landlord".to_string());
        // today (2024-03-10) is before the window opens
        assert_eq!(reason(&vague), "available date (2024-03-10) is too early");

        let open_now = FilterPolicy {
            avail_from: today(),
            ..policy()
        };
        assert!(open_now.should_notify(&vague, today()).notify);
    }
}
