//! SQLite-backed persistence

mod parcel_repository;

pub use parcel_repository::SqliteParcelRepository;
