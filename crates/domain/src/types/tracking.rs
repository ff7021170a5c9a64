//! Normalized tracking layer
//!
//! The unified shipping state parsed from any API provider, plus the
//! ephemeral outputs of the text classifier and the smart-paste parser.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::parcel::ParcelStatus;
use super::provider::Carrier;

/// Core, unified shipping status parsed from any API provider.
///
/// Created fresh on every sync call and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTrackingInfo {
    /// Identifier of the local parcel record this result belongs to.
    pub entry_id: Uuid,
    /// The unique ID assigned by the API provider, when any.
    pub provider_tracking_id: Option<String>,
    /// Standardized parcel status. Always present; unrecognized provider
    /// vocabulary normalizes to `InTransit`.
    pub status: ParcelStatus,
    /// Number of days in transit.
    pub transit_time_days: Option<i32>,
    /// Time of the most recent tracking update.
    pub latest_checkpoint_time: Option<DateTime<Utc>>,
    /// The raw payload text, retained verbatim for diagnostics.
    pub raw_payload: Option<String>,
}

/// One physical tracking scan/checkpoint.
///
/// Adapters only emit events with a parseable timestamp; sequences are
/// sorted strictly descending by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingTimelineEvent {
    pub timestamp: DateTime<Utc>,
    pub description: String,
    /// City/state/country joined with ", "; omitted when all parts empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Provider-specific fine-grained status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_status: Option<String>,
}

/// The unit produced per parcel by a provider sync and folded back into
/// the stored parcel record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncUpdate {
    pub info: NormalizedTrackingInfo,
    /// Timeline events, newest first.
    pub timeline: Vec<TrackingTimelineEvent>,
}

/// Status inferred from raw scraped page text.
///
/// Not persisted; the caller folds it into one new timeline event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedStatus {
    pub status: ParcelStatus,
    pub description: String,
    pub expected_delivery: Option<NaiveDate>,
}

/// Fields independently extracted from pasted free text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedParcelData {
    pub tracking_number: Option<String>,
    pub order_number: Option<String>,
    pub carrier: Carrier,
}

impl Default for ParsedParcelData {
    fn default() -> Self {
        Self { tracking_number: None, order_number: None, carrier: Carrier::Auto }
    }
}
