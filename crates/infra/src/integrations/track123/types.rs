//! Serde mirror of the Track123 wire format.

use serde::Deserialize;

/// Envelope returned by every Track123 endpoint.
#[derive(Debug, Deserialize)]
pub struct Track123Envelope {
    pub code: String,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// `data` shape of a query response.
#[derive(Debug, Deserialize)]
pub struct Track123QueryData {
    #[serde(default)]
    pub accepted: Option<Track123AcceptedPage>,
}

#[derive(Debug, Deserialize)]
pub struct Track123AcceptedPage {
    #[serde(default)]
    pub content: Option<Vec<serde_json::Value>>,
}

/// One accepted tracking object (the payload handed to the adapter).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track123TrackingObject {
    #[serde(default)]
    pub track_no: Option<String>,
    #[serde(default)]
    pub tracking_status: Option<String>,
    #[serde(default)]
    pub transit_status: Option<String>,
    #[serde(default)]
    pub receipt_days: Option<i32>,
    #[serde(default)]
    pub last_tracking_time: Option<String>,
    #[serde(default)]
    pub local_logistics_info: Option<Track123LogisticsInfo>,
    #[serde(default)]
    pub last_mile_info: Option<Track123LastMileInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track123LogisticsInfo {
    #[serde(default)]
    pub tracking_details: Option<Vec<Track123TrackingDetail>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track123LastMileInfo {
    #[serde(default)]
    pub lm_track_no: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track123TrackingDetail {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub event_detail: Option<String>,
    #[serde(default)]
    pub transit_sub_status: Option<String>,
}

/// Courier candidate from the courier-detect endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track123Courier {
    #[serde(default)]
    pub courier_code: Option<String>,
}
