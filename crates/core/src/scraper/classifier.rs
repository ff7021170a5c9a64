//! Status classification of raw tracking-page text

use chrono::{NaiveDate, Utc};
use lazy_static::lazy_static;
use packtrail_domain::{ParcelStatus, ScrapedStatus};
use regex::Regex;

use super::dates;

/// Portion of the page that is inspected. Carriers put the current status
/// near the top of the rendered page.
const SEARCH_WINDOW: usize = 1000;

// Signal words per bucket. We look for signal words rather than exact
// sentences, so carrier copy changes survive longer.
const DELIVERED_SIGNALS: &[&str] =
    &["delivered", "left at", "signed for", "front desk", "porch", "mailbox"];
const PICKUP_READY_SIGNALS: &[&str] =
    &["ready for pickup", "available for pickup", "held at location", "collect your package"];
const EXCEPTION_SIGNALS: &[&str] =
    &["exception", "delay", "held", "customs", "action required", "delivery failed"];
const OUT_FOR_DELIVERY_SIGNALS: &[&str] = &["out for delivery", "on vehicle"];
const TRANSIT_SIGNALS: &[&str] = &[
    "transit",
    "on the way",
    "departed",
    "arrived at",
    "we have your package",
    "possession",
    "picked up",
];
const PRE_SHIPMENT_SIGNALS: &[&str] =
    &["label created", "information received", "awaiting item", "order processed"];

lazy_static! {
    // Carriers that invent new wording still tend to render a literal
    // "Status: xyz" pair somewhere near the top.
    static ref STATUS_ANCHOR: Regex = Regex::new(r"status\s*[:\-]?\s*([a-z ]{3,30})").unwrap();
}

/// Infers shipment status, description, and expected-delivery date from
/// raw scraped page text.
pub struct TextStatusClassifier;

impl TextStatusClassifier {
    /// Classify raw page text. `None` means no confident signal was
    /// found; callers treat that as "no update", never as an error.
    pub fn classify(page_text: &str) -> Option<ScrapedStatus> {
        Self::classify_at(page_text, Utc::now().date_naive())
    }

    /// Classify with an explicit reference date so relative phrases like
    /// "tomorrow" resolve deterministically.
    pub fn classify_at(page_text: &str, today: NaiveDate) -> Option<ScrapedStatus> {
        let lowered = page_text.to_lowercase();
        let window: String = lowered.chars().take(SEARCH_WINDOW).collect();
        // Collapse whitespace runs so a status phrase split across a line
        // break still matches.
        let search_area = window.split_whitespace().collect::<Vec<_>>().join(" ");

        let expected_delivery = dates::extract_expected_delivery(&search_area, today);

        // Highest-priority (terminal) buckets first: a page's history
        // table may list "Label Created" below a later "Delivered".
        if let Some(signal) = first_match(&search_area, DELIVERED_SIGNALS) {
            return Some(ScrapedStatus {
                status: ParcelStatus::Delivered,
                description: title_case(signal),
                expected_delivery,
            });
        }

        if first_match(&search_area, PICKUP_READY_SIGNALS).is_some() {
            return Some(ScrapedStatus {
                status: ParcelStatus::OutForDelivery,
                description: "Ready for Pickup".to_string(),
                expected_delivery,
            });
        }

        if first_match(&search_area, EXCEPTION_SIGNALS).is_some() {
            return Some(ScrapedStatus {
                status: ParcelStatus::Exception,
                description: "Attention Needed".to_string(),
                expected_delivery,
            });
        }

        if first_match(&search_area, OUT_FOR_DELIVERY_SIGNALS).is_some() {
            return Some(ScrapedStatus {
                status: ParcelStatus::OutForDelivery,
                description: "Out for Delivery".to_string(),
                expected_delivery,
            });
        }

        if first_match(&search_area, TRANSIT_SIGNALS).is_some() {
            return Some(ScrapedStatus {
                status: ParcelStatus::InTransit,
                description: "In Transit".to_string(),
                expected_delivery,
            });
        }

        if first_match(&search_area, PRE_SHIPMENT_SIGNALS).is_some() {
            return Some(ScrapedStatus {
                status: ParcelStatus::PreShipment,
                description: "Label Created".to_string(),
                expected_delivery,
            });
        }

        // Anchor fallback for unrecognized wording.
        if let Some(caps) = STATUS_ANCHOR.captures(&search_area) {
            let captured = caps[1].trim();
            if !captured.is_empty() {
                return Some(ScrapedStatus {
                    status: ParcelStatus::Shipped,
                    description: title_case(captured),
                    expected_delivery,
                });
            }
        }

        None
    }
}

fn first_match<'a>(haystack: &str, signals: &[&'a str]) -> Option<&'a str> {
    signals.iter().copied().find(|signal| haystack.contains(signal))
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
