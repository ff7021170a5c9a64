//! Tracking API providers and carriers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported structured tracking API providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    Track123,
    Trackingmore,
}

impl ApiProvider {
    /// All known providers.
    pub const ALL: [Self; 2] = [Self::Track123, Self::Trackingmore];

    /// Human-readable provider name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Track123 => "Track123",
            Self::Trackingmore => "Trackingmore",
        }
    }

    /// Account name under which this provider's API key is stored in the
    /// credential store.
    pub fn credential_account(self) -> &'static str {
        match self {
            Self::Track123 => "api_key_track123",
            Self::Trackingmore => "api_key_trackingmore",
        }
    }
}

impl fmt::Display for ApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Carrier identity, either chosen by the user or inferred from the
/// tracking number's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Auto,
    Ups,
    FedEx,
    Usps,
    Dhl,
    Unknown,
}

impl Carrier {
    /// Human-readable carrier name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Auto => "Auto-Detect",
            Self::Ups => "UPS",
            Self::FedEx => "FedEx",
            Self::Usps => "USPS",
            Self::Dhl => "DHL",
            Self::Unknown => "Other",
        }
    }

    /// True when the carrier still needs detection.
    pub fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
