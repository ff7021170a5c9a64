//! Converts Trackingmore payloads into the normalized model.

use chrono::{DateTime, NaiveDateTime, Utc};
use packtrail_core::adapter::TrackingAdapter;
use packtrail_domain::{
    NormalizedTrackingInfo, PacktrailError, Parcel, ParcelStatus, Result, SyncUpdate,
    TrackingTimelineEvent,
};

use super::types::{TrackingmoreCheckpoint, TrackingmoreRoot};

const META_SUCCESS: i64 = 200;

/// Adapter for the strict `{meta, data}` Trackingmore root.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrackingmoreAdapter;

impl TrackingAdapter for TrackingmoreAdapter {
    fn adapt(&self, raw: &[u8], parcel: &Parcel) -> Result<SyncUpdate> {
        let root: TrackingmoreRoot = serde_json::from_slice(raw)
            .map_err(|e| PacktrailError::Decoding(format!("Trackingmore payload: {e}")))?;

        // Strict decoding: a non-success meta or missing body is invalid
        // data, not an empty update.
        if root.meta.code != META_SUCCESS {
            return Err(PacktrailError::Decoding(format!(
                "Trackingmore payload carries meta code {}",
                root.meta.code
            )));
        }
        let Some(body) = root.data else {
            return Err(PacktrailError::Decoding("Trackingmore payload has no data".into()));
        };

        let status = map_status(body.delivery_status.as_deref());

        // Providers split the journey into origin and destination legs;
        // merge both before sorting.
        let mut events: Vec<TrackingTimelineEvent> = Vec::new();
        collect_events(&mut events, body.origin_info.as_ref().and_then(|b| b.trackinfo.as_ref()));
        collect_events(
            &mut events,
            body.destination_info.as_ref().and_then(|b| b.trackinfo.as_ref()),
        );
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let latest_checkpoint_time = body
            .latest_checkpoint_time
            .as_deref()
            .and_then(parse_checkpoint_date)
            .or_else(|| events.first().map(|event| event.timestamp));

        let info = NormalizedTrackingInfo {
            entry_id: parcel.id,
            provider_tracking_id: body.id,
            status,
            transit_time_days: body.transit_time,
            latest_checkpoint_time,
            raw_payload: Some(String::from_utf8_lossy(raw).into_owned()),
        };

        Ok(SyncUpdate { info, timeline: events })
    }
}

fn collect_events(
    events: &mut Vec<TrackingTimelineEvent>,
    checkpoints: Option<&Vec<TrackingmoreCheckpoint>>,
) {
    let Some(checkpoints) = checkpoints else { return };
    for checkpoint in checkpoints {
        // Checkpoints without a parseable date are dropped.
        let Some(timestamp) = parse_checkpoint_date(&checkpoint.checkpoint_date) else {
            continue;
        };

        let location_parts: Vec<&str> = [
            checkpoint.city.as_deref(),
            checkpoint.state.as_deref(),
            checkpoint.country_iso2.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect();

        events.push(TrackingTimelineEvent {
            timestamp,
            description: checkpoint.tracking_detail.clone(),
            location: if location_parts.is_empty() {
                None
            } else {
                Some(location_parts.join(", "))
            },
            sub_status: checkpoint.checkpoint_delivery_substatus.clone(),
        });
    }
}

/// Trackingmore largely uses ISO-8601, with and without fractional
/// seconds; some couriers feed it naive timestamps.
fn parse_checkpoint_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(parsed.and_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok().map(|naive| naive.and_utc())
}

/// Maps Trackingmore's `delivery_status` vocabulary ("pending",
/// "notfound", "transit", "pickup", "outfordelivery", "delivered",
/// "undelivered", "exception", "expired") to the canonical status.
fn map_status(raw: Option<&str>) -> ParcelStatus {
    let Some(raw) = raw else { return ParcelStatus::Ordered };
    match raw.to_lowercase().as_str() {
        "pending" | "notfound" => ParcelStatus::PreShipment,
        "transit" => ParcelStatus::InTransit,
        "pickup" | "outfordelivery" => ParcelStatus::OutForDelivery,
        "delivered" => ParcelStatus::Delivered,
        "undelivered" | "exception" | "expired" => ParcelStatus::Exception,
        _ => ParcelStatus::InTransit,
    }
}
