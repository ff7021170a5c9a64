//! Track123 integration
//!
//! Envelope: `{code, msg, data}` with string codes; tracking payloads sit
//! under `data.accepted.content`.

mod adapter;
mod client;
pub mod types;

pub use adapter::Track123Adapter;
pub use client::{Track123Client, DEFAULT_BASE_URL};
