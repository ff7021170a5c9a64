//! Provider adapter abstraction

use packtrail_domain::{Parcel, Result, SyncUpdate};

/// Converts one provider's raw response payload into the normalized
/// tracking model.
///
/// Implementations are pure: strict decoding plus vocabulary mapping, no
/// I/O. An unrecognized provider *status string* must normalize to
/// `InTransit` rather than fail; only a payload that does not match the
/// provider's documented shape is an error.
pub trait TrackingAdapter: Send + Sync {
    /// Decode `raw` for `parcel` into a normalized update.
    ///
    /// # Errors
    /// Returns [`packtrail_domain::PacktrailError::Decoding`] when the
    /// payload cannot be decoded into the provider's documented shape.
    fn adapt(&self, raw: &[u8], parcel: &Parcel) -> Result<SyncUpdate>;
}
