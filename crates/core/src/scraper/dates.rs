//! Expected-delivery date extraction from scraped text

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

/// Phrases that precede an expected delivery date on carrier pages.
const DATE_TRIGGERS: &[&str] = &[
    "estimated delivery",
    "expected delivery",
    "estimated to arrive on or before",
    "arriving by",
    "delivery date",
];

/// Characters inspected after a trigger phrase.
const TRIGGER_WINDOW: usize = 100;

lazy_static! {
    static ref ISO_DATE: Regex = Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap();
    static ref NUMERIC_DATE: Regex =
        Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{2,4}))?\b").unwrap();
    static ref MONTH_NAME_DATE: Regex = Regex::new(
        r"\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?"
    )
    .unwrap();
}

/// Scan `text` (already lowercased and whitespace-collapsed) for a
/// delivery-date trigger phrase and parse the date that follows it.
///
/// `today` anchors relative phrases and supplies the year when the page
/// omits it. Parse failure leaves the result empty, never an error.
pub fn extract_expected_delivery(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let after_trigger =
        DATE_TRIGGERS.iter().find_map(|trigger| text.find(trigger).map(|idx| idx + trigger.len()))?;
    let target: String = text[after_trigger..].chars().take(TRIGGER_WINDOW).collect();

    // Relative phrases first; carriers love "arriving by tomorrow".
    if target.contains("today") {
        return Some(today);
    }
    if target.contains("tomorrow") {
        return today.succ_opt();
    }

    parse_natural_date(&target, today)
}

fn parse_natural_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(date) = try_iso(text) {
        return Some(date);
    }
    if let Some(date) = try_numeric(text, today) {
        return Some(date);
    }
    try_month_name(text, today)
}

fn try_iso(text: &str) -> Option<NaiveDate> {
    let caps = ISO_DATE.captures(text)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn try_numeric(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    use chrono::Datelike;

    let caps = NUMERIC_DATE.captures(text)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year = match caps.get(3) {
        Some(raw) => {
            let value: i32 = raw.as_str().parse().ok()?;
            if value < 100 {
                2000 + value
            } else {
                value
            }
        }
        None => today.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn try_month_name(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    use chrono::Datelike;

    let caps = MONTH_NAME_DATE.captures(text)?;
    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let year = match caps.get(3) {
        Some(raw) => raw.as_str().parse().ok()?,
        None => today.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(prefix: &str) -> Option<u32> {
    match prefix {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}
