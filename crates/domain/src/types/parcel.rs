//! Parcel record and its status lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tracking::TrackingTimelineEvent;

/// Canonical, provider-independent shipment status.
///
/// The numeric codes are the historical persistence values: codes 0-4
/// predate the richer lifecycle and the later variants were appended, so
/// persisted codes are NOT in lifecycle order. Use [`ParcelStatus::lifecycle_rank`]
/// for ordering and [`ParcelStatus::code`] for storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    Ordered,
    Draft,
    PreShipment,
    Shipped,
    InTransit,
    OutForDelivery,
    Delivered,
    Exception,
    Suspended,
}

/// UI grouping bucket derived from a parcel status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    ToBeActivated,
    OnTheWay,
    Delivered,
    NeedsAttention,
}

impl ParcelStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 9] = [
        Self::Ordered,
        Self::Draft,
        Self::PreShipment,
        Self::Shipped,
        Self::InTransit,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Exception,
        Self::Suspended,
    ];

    /// Persisted numeric code (historical raw values, not lifecycle order).
    pub fn code(self) -> i64 {
        match self {
            Self::Ordered => 0,
            Self::Shipped => 1,
            Self::InTransit => 2,
            Self::Delivered => 3,
            Self::Exception => 4,
            Self::Draft => 5,
            Self::PreShipment => 6,
            Self::OutForDelivery => 7,
            Self::Suspended => 8,
        }
    }

    /// Decode a persisted code. Unknown codes fall back to `Ordered`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Ordered,
            1 => Self::Shipped,
            2 => Self::InTransit,
            3 => Self::Delivered,
            4 => Self::Exception,
            5 => Self::Draft,
            6 => Self::PreShipment,
            7 => Self::OutForDelivery,
            8 => Self::Suspended,
            _ => Self::Ordered,
        }
    }

    /// Position in the shipment lifecycle, earliest stage first.
    pub fn lifecycle_rank(self) -> u8 {
        match self {
            Self::Ordered => 0,
            Self::Draft => 1,
            Self::PreShipment => 2,
            Self::Shipped => 3,
            Self::InTransit => 4,
            Self::OutForDelivery => 5,
            Self::Delivered => 6,
            Self::Exception => 7,
            Self::Suspended => 8,
        }
    }

    /// Human-readable display title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Ordered => "Ordered",
            Self::Draft => "Draft",
            Self::PreShipment => "Pre-Shipment",
            Self::Shipped => "Shipped",
            Self::InTransit => "In Transit",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
            Self::Exception => "Exception",
            Self::Suspended => "Suspended",
        }
    }

    /// Icon tag for the UI layer (SF-symbol style).
    pub fn icon(self) -> &'static str {
        match self {
            Self::Ordered => "cart",
            Self::Draft => "doc.plaintext",
            Self::PreShipment => "shippingbox",
            Self::Shipped => "shippingbox.fill",
            Self::InTransit => "truck.box",
            Self::OutForDelivery => "truck.box.badge.clock",
            Self::Delivered => "checkmark.circle.fill",
            Self::Exception => "exclamationmark.triangle.fill",
            Self::Suspended => "pause.circle.fill",
        }
    }

    /// UI grouping bucket. `Exception` and `Suspended` both need attention.
    pub fn category(self) -> StatusCategory {
        match self {
            Self::Ordered | Self::Draft | Self::PreShipment => StatusCategory::ToBeActivated,
            Self::Shipped | Self::InTransit | Self::OutForDelivery => StatusCategory::OnTheWay,
            Self::Delivered => StatusCategory::Delivered,
            Self::Exception | Self::Suspended => StatusCategory::NeedsAttention,
        }
    }

    /// Terminal statuses are excluded from batch syncing.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Exception)
    }
}

impl StatusCategory {
    /// Section title used when grouping parcels.
    pub fn title(self) -> &'static str {
        match self {
            Self::ToBeActivated => "To Be Activated",
            Self::OnTheWay => "On the Way",
            Self::Delivered => "Delivered",
            Self::NeedsAttention => "Needs Attention",
        }
    }
}

/// Whether a parcel is being received or sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelDirection {
    Incoming,
    Outgoing,
}

impl ParcelDirection {
    /// Persisted numeric code.
    pub fn code(self) -> i64 {
        match self {
            Self::Incoming => 0,
            Self::Outgoing => 1,
        }
    }

    /// Decode a persisted code. Unknown codes fall back to `Incoming`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Outgoing,
            _ => Self::Incoming,
        }
    }

    /// Human-readable display title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Incoming => "Incoming",
            Self::Outgoing => "Outgoing",
        }
    }
}

/// A tracked parcel as held in local storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parcel {
    pub id: Uuid,
    pub title: String,
    pub tracking_number: Option<String>,
    pub order_number: Option<String>,
    /// Display name of the carrier, when known.
    pub carrier: Option<String>,
    pub direction: ParcelDirection,
    pub status: ParcelStatus,
    pub archived: bool,
    pub notes: Option<String>,
    pub expected_delivery: Option<NaiveDate>,
    pub date_added: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Tracking history, newest event first.
    pub timeline: Vec<TrackingTimelineEvent>,
}

impl Parcel {
    /// True when the parcel should be included in a batch sync.
    pub fn is_active(&self) -> bool {
        !self.archived && !self.status.is_terminal()
    }
}
