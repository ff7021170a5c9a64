//! Trackingmore integration
//!
//! Envelope: `{meta: {code, message}, data}` with numeric codes; query
//! responses carry an array of tracking objects in `data`.

mod adapter;
mod client;
pub mod types;

pub use adapter::TrackingmoreAdapter;
pub use client::{TrackingmoreClient, DEFAULT_BASE_URL};
