//! Batch sync coordination

pub mod ports;
pub mod service;

pub use service::{NewParcel, SyncService};
