//! # Packtrail Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Carrier detection and scraped-text classification
//! - Port/adapter interfaces (traits)
//! - The sync coordination service
//!
//! ## Architecture Principles
//! - Only depends on `packtrail-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod adapter;
pub mod carrier;
pub mod paste;
pub mod scraper;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use adapter::TrackingAdapter;
pub use carrier::CarrierDetector;
pub use paste::SmartPasteParser;
pub use scraper::TextStatusClassifier;
pub use sync::ports::{CredentialStore, ParcelRepository, TrackingProvider};
pub use sync::{NewParcel, SyncService};
