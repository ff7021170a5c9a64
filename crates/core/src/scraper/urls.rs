//! Public tracking-page URLs per carrier

/// Build the tracking page URL the scraper should load for a parcel.
///
/// Falls back to a web search when the carrier has no known direct
/// tracking page.
pub fn tracking_url(carrier: &str, tracking_number: &str) -> String {
    let clean_carrier = carrier.to_lowercase();
    let clean_tracking = tracking_number.trim();

    if clean_carrier.contains("ups") {
        return format!("https://www.ups.com/track?tracknum={clean_tracking}");
    }
    if clean_carrier.contains("usps") {
        return format!("https://tools.usps.com/go/TrackConfirmAction?tLabels={clean_tracking}");
    }
    if clean_carrier.contains("fedex") {
        return format!("https://www.fedex.com/fedextrack/?trknbr={clean_tracking}");
    }
    if clean_carrier.contains("dhl") {
        return format!(
            "https://www.dhl.com/global-en/home/tracking/tracking-express.html?submit=1&tracking-id={clean_tracking}"
        );
    }

    let query = format!("{carrier} tracking {tracking_number}");
    format!("https://duckduckgo.com/?q={}", urlencoding::encode(&query))
}
