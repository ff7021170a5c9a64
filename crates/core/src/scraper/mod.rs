//! Heuristic logic for the scraped-page fallback channel
//!
//! When no structured API key is configured, tracking pages are loaded by
//! an external browser-automation collaborator and their rendered text is
//! classified here.

pub mod classifier;
pub mod dates;
pub mod urls;

pub use classifier::TextStatusClassifier;
pub use urls::tracking_url;
