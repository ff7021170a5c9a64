//! # Packtrail Infrastructure
//!
//! Infrastructure adapters behind the core ports.
//!
//! This crate contains:
//! - HTTP client wrapper with retry semantics
//! - Keyring-backed credential storage
//! - SQLite parcel persistence
//! - Per-provider sync orchestrators and payload adapters
//! - Configuration loading and error conversions

pub mod config;
pub mod credentials;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;

pub use credentials::KeyringCredentialStore;
pub use database::SqliteParcelRepository;
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::track123::Track123Client;
pub use integrations::trackingmore::TrackingmoreClient;
