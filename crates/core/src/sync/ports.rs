//! Port interfaces for the sync workflow
//!
//! These traits define the boundaries between core business logic and
//! infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use packtrail_domain::{
    ApiProvider, Parcel, ParcelStatus, Result, SyncUpdate, TrackingTimelineEvent,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Read/write access to provider API keys.
///
/// The core never holds credentials beyond the scope of one sync call.
pub trait CredentialStore: Send + Sync {
    /// Read the stored secret; `Ok(None)` when absent.
    fn read(&self, provider: ApiProvider) -> Result<Option<String>>;

    /// Store or replace the secret.
    fn write(&self, provider: ApiProvider, secret: &str) -> Result<()>;

    /// Remove the secret. Removing an absent secret is not an error.
    fn delete(&self, provider: ApiProvider) -> Result<()>;
}

/// Persistence for parcel records.
#[async_trait]
pub trait ParcelRepository: Send + Sync {
    /// Persist a new parcel.
    async fn insert(&self, parcel: &Parcel) -> Result<()>;

    /// Parcels eligible for batch syncing: not archived, not in a
    /// terminal status.
    async fn fetch_active(&self) -> Result<Vec<Parcel>>;

    /// Look up one parcel.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Parcel>>;

    /// Overwrite a parcel's tracking state: status, serialized timeline,
    /// expected delivery, and last-updated timestamp.
    async fn update_tracking(
        &self,
        id: Uuid,
        status: ParcelStatus,
        timeline: &[TrackingTimelineEvent],
        expected_delivery: Option<NaiveDate>,
        last_updated: DateTime<Utc>,
    ) -> Result<()>;

    /// Flip the archived flag.
    async fn set_archived(&self, id: Uuid, archived: bool) -> Result<()>;
}

/// A provider-specific sync orchestrator.
#[async_trait]
pub trait TrackingProvider: Send + Sync {
    /// Which provider this orchestrator talks to.
    fn provider(&self) -> ApiProvider;

    /// Query the provider once per parcel and return normalized updates.
    ///
    /// Per-parcel failures are logged and skipped. Auth and quota
    /// failures abort the remaining batch. `cancel` is honored between
    /// parcels; updates gathered before cancellation are still returned.
    async fn sync_parcels(
        &self,
        parcels: &[Parcel],
        api_key: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SyncUpdate>>;

    /// Cheap authenticated call that checks an API key before it is
    /// saved to the credential store.
    async fn validate_key(&self, api_key: &str) -> Result<()>;
}
