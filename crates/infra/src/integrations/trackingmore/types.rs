//! Serde mirror of the Trackingmore v4 wire format.

use serde::{Deserialize, Serialize};

/// Meta block carried by every response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingmoreMeta {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Lenient envelope used by the orchestrator to route on meta codes.
#[derive(Debug, Deserialize)]
pub struct TrackingmoreEnvelope {
    pub meta: TrackingmoreMeta,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Strict root the adapter decodes: meta plus exactly one tracking object.
#[derive(Debug, Deserialize)]
pub struct TrackingmoreRoot {
    pub meta: TrackingmoreMeta,
    #[serde(default)]
    pub data: Option<TrackingmoreData>,
}

#[derive(Debug, Deserialize)]
pub struct TrackingmoreData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub delivery_status: Option<String>,
    #[serde(default)]
    pub substatus: Option<String>,
    #[serde(default)]
    pub transit_time: Option<i32>,
    #[serde(default)]
    pub latest_checkpoint_time: Option<String>,
    #[serde(default)]
    pub origin_info: Option<TrackingmoreInfoBlock>,
    #[serde(default)]
    pub destination_info: Option<TrackingmoreInfoBlock>,
}

#[derive(Debug, Deserialize)]
pub struct TrackingmoreInfoBlock {
    #[serde(default)]
    pub trackinfo: Option<Vec<TrackingmoreCheckpoint>>,
}

#[derive(Debug, Deserialize)]
pub struct TrackingmoreCheckpoint {
    pub checkpoint_date: String,
    #[serde(default)]
    pub checkpoint_delivery_status: Option<String>,
    #[serde(default)]
    pub checkpoint_delivery_substatus: Option<String>,
    pub tracking_detail: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub country_iso2: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Courier candidate from the courier-detect endpoint.
#[derive(Debug, Deserialize)]
pub struct TrackingmoreCourier {
    #[serde(default)]
    pub courier_code: Option<String>,
}
