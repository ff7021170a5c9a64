//! Converts Track123 tracking payloads into the normalized model.

use chrono::{DateTime, NaiveDateTime, Utc};
use packtrail_core::adapter::TrackingAdapter;
use packtrail_domain::{
    NormalizedTrackingInfo, PacktrailError, Parcel, ParcelStatus, Result, SyncUpdate,
    TrackingTimelineEvent,
};

use super::types::Track123TrackingObject;

/// Track123 event times come as "2024-01-01 12:00:00" in UTC.
const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Adapter for the Track123 accepted-content payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct Track123Adapter;

impl TrackingAdapter for Track123Adapter {
    fn adapt(&self, raw: &[u8], parcel: &Parcel) -> Result<SyncUpdate> {
        let object: Track123TrackingObject = serde_json::from_slice(raw)
            .map_err(|e| PacktrailError::Decoding(format!("Track123 payload: {e}")))?;

        let status_source = object
            .transit_status
            .as_deref()
            .or(object.tracking_status.as_deref())
            .unwrap_or("unknown");
        let status = map_status(status_source);

        let mut events: Vec<TrackingTimelineEvent> = Vec::new();
        if let Some(details) =
            object.local_logistics_info.as_ref().and_then(|info| info.tracking_details.as_ref())
        {
            for detail in details {
                // Events without a parseable time are dropped, not kept
                // with a null timestamp.
                let Some(timestamp) = detail.event_time.as_deref().and_then(parse_event_time)
                else {
                    continue;
                };
                events.push(TrackingTimelineEvent {
                    timestamp,
                    description: detail
                        .event_detail
                        .clone()
                        .unwrap_or_else(|| "Update".to_string()),
                    location: detail.address.clone().filter(|a| !a.is_empty()),
                    sub_status: detail.transit_sub_status.clone(),
                });
            }
        }
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let latest_checkpoint_time = object
            .last_tracking_time
            .as_deref()
            .and_then(parse_event_time)
            .or_else(|| events.first().map(|event| event.timestamp));

        let info = NormalizedTrackingInfo {
            entry_id: parcel.id,
            provider_tracking_id: object
                .track_no
                .clone()
                .or_else(|| object.last_mile_info.as_ref().and_then(|lm| lm.lm_track_no.clone())),
            status,
            transit_time_days: object.receipt_days,
            latest_checkpoint_time,
            raw_payload: Some(String::from_utf8_lossy(raw).into_owned()),
        };

        Ok(SyncUpdate { info, timeline: events })
    }
}

fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, EVENT_TIME_FORMAT).ok().map(|naive| naive.and_utc())
}

/// Maps Track123 status vocabulary to the canonical status.
///
/// Substring matching first (`transitStatus` words like "IN_TRANSIT"),
/// then the numeric `trackingStatus` table, then the safe default.
fn map_status(raw: &str) -> ParcelStatus {
    let lower = raw.to_lowercase();

    if lower.contains("pending") || lower.contains("info_received") {
        return ParcelStatus::PreShipment;
    }
    if lower.contains("out_for_delivery") || lower.contains("outfordelivery") {
        return ParcelStatus::OutForDelivery;
    }
    if lower.contains("transit") || lower.contains("pickup") || lower.contains("departed") {
        return ParcelStatus::InTransit;
    }
    if lower.contains("delivered") || lower.contains("receive") {
        return ParcelStatus::Delivered;
    }
    if lower.contains("exception") || lower.contains("alert") || lower.contains("undelivered") {
        return ParcelStatus::Exception;
    }
    if lower.contains("expired") {
        return ParcelStatus::Suspended;
    }

    match raw {
        "001" => ParcelStatus::PreShipment,
        "002" => ParcelStatus::InTransit,
        "003" => ParcelStatus::OutForDelivery,
        "004" => ParcelStatus::Delivered,
        "005" => ParcelStatus::Exception,
        "006" => ParcelStatus::Suspended,
        _ => ParcelStatus::InTransit,
    }
}
