//! Carrier inference from tracking-number shape

use packtrail_domain::Carrier;

/// Infers the carrier from a tracking number's format alone.
pub struct CarrierDetector;

impl CarrierDetector {
    /// Guess the carrier for `tracking_number`.
    ///
    /// Deterministic, case- and whitespace-insensitive, and infallible:
    /// unmatched input yields [`Carrier::Unknown`], never an error.
    pub fn detect(tracking_number: &str) -> Carrier {
        let clean: String = tracking_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        // UPS: 1Z... (18 alphanumeric)
        if clean.starts_with("1Z")
            && clean.len() == 18
            && clean.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Carrier::Ups;
        }

        let all_digits = !clean.is_empty() && clean.bytes().all(|b| b.is_ascii_digit());

        if all_digits {
            let length = clean.len();
            // Weak heuristic: pure digits at these lengths are usually
            // FedEx. Checked before USPS, so a 22-digit "9..." number
            // resolves as FedEx.
            if (12..=15).contains(&length) || length == 22 || length == 34 {
                return Carrier::FedEx;
            }

            // USPS: 20-22 digits starting with 9 (e.g. 9400...)
            if (20..=22).contains(&length) && clean.starts_with('9') {
                return Carrier::Usps;
            }

            // DHL: 10 digit numeric
            if length == 10 {
                return Carrier::Dhl;
            }
        }

        Carrier::Unknown
    }
}
