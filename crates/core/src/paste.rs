//! Extraction of tracking and order numbers from pasted free text

use lazy_static::lazy_static;
use packtrail_domain::{Carrier, ParsedParcelData};
use regex::Regex;

lazy_static! {
    static ref UPS_NUMBER: Regex = Regex::new(r"\b1Z[0-9A-Z]{16}\b").unwrap();
    static ref USPS_NUMBER: Regex = Regex::new(r"\b9[2-5][0-9]{20}\b").unwrap();
    // 12-15 digits is a common FedEx shape, with known false positives.
    static ref FEDEX_NUMBER: Regex = Regex::new(r"\b[0-9]{12,15}\b").unwrap();
    // "Order #12345-ABC", "Order: 12345", "order id 12345"
    static ref ORDER_NUMBER: Regex =
        Regex::new(r"(?i)order\s*(?:number|id|#)?\s*[:#\-]?\s*([A-Z0-9\-]{5,20})").unwrap();
}

/// Parses clipboard text into independently extracted parcel fields.
pub struct SmartPasteParser;

impl SmartPasteParser {
    /// Extract whatever parcel data the text happens to contain. Every
    /// field is optional; extraction of one never depends on another.
    pub fn parse(text: &str) -> ParsedParcelData {
        let clean = text.trim();
        let mut result = ParsedParcelData::default();

        if let Some(found) = UPS_NUMBER.find(clean) {
            result.tracking_number = Some(found.as_str().to_string());
            result.carrier = Carrier::Ups;
        } else if let Some(found) = USPS_NUMBER.find(clean) {
            result.tracking_number = Some(found.as_str().to_string());
            result.carrier = Carrier::Usps;
        } else if let Some(found) = FEDEX_NUMBER.find(clean) {
            result.tracking_number = Some(found.as_str().to_string());
            result.carrier = Carrier::FedEx;
        }

        if let Some(caps) = ORDER_NUMBER.captures(clean) {
            result.order_number = Some(caps[1].to_string());
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ups_number_and_carrier() {
        let parsed = SmartPasteParser::parse("Your shipment 1Z999AA10123456784 is on its way");
        assert_eq!(parsed.tracking_number.as_deref(), Some("1Z999AA10123456784"));
        assert_eq!(parsed.carrier, Carrier::Ups);
    }

    #[test]
    fn extracts_usps_number() {
        let text = format!("Track it: 94{}", "1".repeat(20));
        let parsed = SmartPasteParser::parse(&text);
        assert_eq!(parsed.carrier, Carrier::Usps);
        assert_eq!(parsed.tracking_number.unwrap().len(), 22);
    }

    #[test]
    fn twelve_digit_runs_read_as_fedex() {
        let parsed = SmartPasteParser::parse("shipment no. 123456789012 confirmed");
        assert_eq!(parsed.tracking_number.as_deref(), Some("123456789012"));
        assert_eq!(parsed.carrier, Carrier::FedEx);
    }

    #[test]
    fn order_number_is_extracted_independently() {
        let parsed = SmartPasteParser::parse("Order #A1234-BC shipped via 1Z999AA10123456784");
        assert_eq!(parsed.order_number.as_deref(), Some("A1234-BC"));
        assert_eq!(parsed.carrier, Carrier::Ups);
    }

    #[test]
    fn order_prefix_variants() {
        assert_eq!(
            SmartPasteParser::parse("order id: 778899").order_number.as_deref(),
            Some("778899")
        );
        assert_eq!(
            SmartPasteParser::parse("ORDER 12345X").order_number.as_deref(),
            Some("12345X")
        );
    }

    #[test]
    fn empty_input_parses_to_defaults() {
        let parsed = SmartPasteParser::parse("   ");
        assert_eq!(parsed, ParsedParcelData::default());
    }
}
