//! Sync coordination service - core business logic

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use packtrail_domain::{
    ApiProvider, Carrier, PacktrailError, Parcel, ParcelDirection, ParcelStatus, Result,
    ScrapedStatus, SyncUpdate, TrackingTimelineEvent,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::ports::{CredentialStore, ParcelRepository, TrackingProvider};
use crate::carrier::CarrierDetector;
use crate::scraper::TextStatusClassifier;

/// Input for creating a parcel record.
#[derive(Debug, Clone)]
pub struct NewParcel {
    pub title: String,
    pub tracking_number: String,
    pub order_number: Option<String>,
    pub direction: ParcelDirection,
    pub carrier: Carrier,
    pub notes: Option<String>,
    pub expected_delivery: Option<NaiveDate>,
}

/// Coordinates batch syncs and scraper-driven single-parcel updates.
///
/// Holds no credentials itself; keys are read from the credential store
/// per sync call and dropped afterwards.
pub struct SyncService {
    credentials: Arc<dyn CredentialStore>,
    parcels: Arc<dyn ParcelRepository>,
    providers: HashMap<ApiProvider, Arc<dyn TrackingProvider>>,
}

impl SyncService {
    /// Create a new sync service.
    pub fn new(credentials: Arc<dyn CredentialStore>, parcels: Arc<dyn ParcelRepository>) -> Self {
        Self { credentials, parcels, providers: HashMap::new() }
    }

    /// Register a provider orchestrator.
    pub fn with_provider(mut self, orchestrator: Arc<dyn TrackingProvider>) -> Self {
        self.providers.insert(orchestrator.provider(), orchestrator);
        self
    }

    /// Sync every active parcel through `provider` and fold the results
    /// back into storage.
    ///
    /// Fails fast with `CredentialMissing` before any network call when
    /// no key is configured. Partial progress already written to storage
    /// is not rolled back on cancellation.
    pub async fn sync_active(
        &self,
        provider: ApiProvider,
        cancel: &CancellationToken,
    ) -> Result<Vec<SyncUpdate>> {
        let api_key =
            self.credentials.read(provider)?.filter(|key| !key.is_empty()).ok_or_else(|| {
                PacktrailError::CredentialMissing(format!(
                    "{provider} API key is missing. Please add it in Settings."
                ))
            })?;

        let orchestrator = self.providers.get(&provider).ok_or_else(|| {
            PacktrailError::Config(format!("no orchestrator registered for {provider}"))
        })?;

        let active = self.parcels.fetch_active().await?;
        if active.is_empty() {
            return Ok(Vec::new());
        }

        let updates = orchestrator.sync_parcels(&active, &api_key, cancel).await?;

        // Batch path: status and timeline are replaced wholesale.
        for update in &updates {
            let Some(parcel) = active.iter().find(|p| p.id == update.info.entry_id) else {
                warn!(entry_id = %update.info.entry_id, "sync result without a matching parcel");
                continue;
            };
            self.parcels
                .update_tracking(
                    parcel.id,
                    update.info.status,
                    &update.timeline,
                    parcel.expected_delivery,
                    Utc::now(),
                )
                .await?;
        }

        info!(applied = updates.len(), %provider, "batch sync finished");
        Ok(updates)
    }

    /// Fold one scraped page text into a parcel.
    ///
    /// Scraper path: classify, then prepend exactly one new event to the
    /// existing timeline and update status / last-updated / expected
    /// delivery. `Ok(None)` means the classifier found no confident
    /// signal and the parcel was left untouched.
    pub async fn apply_scraped(
        &self,
        parcel_id: Uuid,
        page_text: &str,
    ) -> Result<Option<ScrapedStatus>> {
        let Some(scraped) = TextStatusClassifier::classify(page_text) else {
            return Ok(None);
        };

        let parcel = self
            .parcels
            .find_by_id(parcel_id)
            .await?
            .ok_or_else(|| PacktrailError::NotFound(format!("parcel {parcel_id} not found")))?;

        let event = TrackingTimelineEvent {
            timestamp: Utc::now(),
            description: scraped.description.clone(),
            location: None,
            sub_status: None,
        };
        let mut timeline = Vec::with_capacity(parcel.timeline.len() + 1);
        timeline.push(event);
        timeline.extend(parcel.timeline.iter().cloned());

        let expected = scraped.expected_delivery.or(parcel.expected_delivery);
        self.parcels
            .update_tracking(parcel.id, scraped.status, &timeline, expected, Utc::now())
            .await?;

        info!(parcel = %parcel_id, status = ?scraped.status, "scraped update applied");
        Ok(Some(scraped))
    }

    /// Create a new parcel record, deriving the initial status and the
    /// carrier name.
    pub async fn register_parcel(&self, draft: NewParcel) -> Result<Parcel> {
        let tracking = draft.tracking_number.trim().to_string();

        // A tracking number means a label exists somewhere; otherwise the
        // parcel is only ordered (incoming) or drafted (outgoing).
        let status = if !tracking.is_empty() {
            ParcelStatus::PreShipment
        } else if draft.direction == ParcelDirection::Incoming {
            ParcelStatus::Ordered
        } else {
            ParcelStatus::Draft
        };

        let carrier = if draft.carrier.is_auto() {
            if tracking.is_empty() {
                None
            } else {
                Some(CarrierDetector::detect(&tracking).name().to_string())
            }
        } else {
            Some(draft.carrier.name().to_string())
        };

        let now = Utc::now();
        let parcel = Parcel {
            id: Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            tracking_number: Some(tracking).filter(|t| !t.is_empty()),
            order_number: draft
                .order_number
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty()),
            carrier,
            direction: draft.direction,
            status,
            archived: false,
            notes: draft.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            expected_delivery: draft.expected_delivery,
            date_added: now,
            last_updated: now,
            timeline: Vec::new(),
        };

        self.parcels.insert(&parcel).await?;
        Ok(parcel)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use packtrail_domain::NormalizedTrackingInfo;

    use super::*;

    #[derive(Default)]
    struct FakeCredentials {
        keys: Mutex<HashMap<ApiProvider, String>>,
    }

    impl FakeCredentials {
        fn with_key(provider: ApiProvider, key: &str) -> Self {
            let store = Self::default();
            store.keys.lock().unwrap().insert(provider, key.to_string());
            store
        }
    }

    impl CredentialStore for FakeCredentials {
        fn read(&self, provider: ApiProvider) -> Result<Option<String>> {
            Ok(self.keys.lock().unwrap().get(&provider).cloned())
        }

        fn write(&self, provider: ApiProvider, secret: &str) -> Result<()> {
            self.keys.lock().unwrap().insert(provider, secret.to_string());
            Ok(())
        }

        fn delete(&self, provider: ApiProvider) -> Result<()> {
            self.keys.lock().unwrap().remove(&provider);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeRepository {
        parcels: Mutex<Vec<Parcel>>,
    }

    impl FakeRepository {
        fn seeded(parcels: Vec<Parcel>) -> Self {
            Self { parcels: Mutex::new(parcels) }
        }

        fn get(&self, id: Uuid) -> Option<Parcel> {
            self.parcels.lock().unwrap().iter().find(|p| p.id == id).cloned()
        }
    }

    #[async_trait]
    impl ParcelRepository for FakeRepository {
        async fn insert(&self, parcel: &Parcel) -> Result<()> {
            self.parcels.lock().unwrap().push(parcel.clone());
            Ok(())
        }

        async fn fetch_active(&self) -> Result<Vec<Parcel>> {
            Ok(self.parcels.lock().unwrap().iter().filter(|p| p.is_active()).cloned().collect())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Parcel>> {
            Ok(self.get(id))
        }

        async fn update_tracking(
            &self,
            id: Uuid,
            status: ParcelStatus,
            timeline: &[TrackingTimelineEvent],
            expected_delivery: Option<NaiveDate>,
            last_updated: DateTime<Utc>,
        ) -> Result<()> {
            let mut parcels = self.parcels.lock().unwrap();
            let parcel = parcels
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| PacktrailError::NotFound(id.to_string()))?;
            parcel.status = status;
            parcel.timeline = timeline.to_vec();
            parcel.expected_delivery = expected_delivery;
            parcel.last_updated = last_updated;
            Ok(())
        }

        async fn set_archived(&self, id: Uuid, archived: bool) -> Result<()> {
            let mut parcels = self.parcels.lock().unwrap();
            let parcel = parcels
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| PacktrailError::NotFound(id.to_string()))?;
            parcel.archived = archived;
            Ok(())
        }
    }

    struct FakeProvider {
        calls: AtomicUsize,
        updates: Vec<SyncUpdate>,
    }

    impl FakeProvider {
        fn returning(updates: Vec<SyncUpdate>) -> Self {
            Self { calls: AtomicUsize::new(0), updates }
        }
    }

    #[async_trait]
    impl TrackingProvider for FakeProvider {
        fn provider(&self) -> ApiProvider {
            ApiProvider::Trackingmore
        }

        async fn sync_parcels(
            &self,
            _parcels: &[Parcel],
            _api_key: &str,
            _cancel: &CancellationToken,
        ) -> Result<Vec<SyncUpdate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.updates.clone())
        }

        async fn validate_key(&self, _api_key: &str) -> Result<()> {
            Ok(())
        }
    }

    fn parcel_with(status: ParcelStatus) -> Parcel {
        let now = Utc::now();
        Parcel {
            id: Uuid::new_v4(),
            title: "Keyboard".to_string(),
            tracking_number: Some("1Z999AA10123456784".to_string()),
            order_number: None,
            carrier: Some("UPS".to_string()),
            direction: ParcelDirection::Incoming,
            status,
            archived: false,
            notes: None,
            expected_delivery: None,
            date_added: now,
            last_updated: now,
            timeline: Vec::new(),
        }
    }

    fn event_at(ts: DateTime<Utc>, description: &str) -> TrackingTimelineEvent {
        TrackingTimelineEvent {
            timestamp: ts,
            description: description.to_string(),
            location: None,
            sub_status: None,
        }
    }

    fn update_for(parcel: &Parcel, status: ParcelStatus) -> SyncUpdate {
        let ts = Utc.with_ymd_and_hms(2026, 2, 20, 12, 0, 0).unwrap();
        SyncUpdate {
            info: NormalizedTrackingInfo {
                entry_id: parcel.id,
                provider_tracking_id: Some("prov-1".to_string()),
                status,
                transit_time_days: Some(3),
                latest_checkpoint_time: Some(ts),
                raw_payload: None,
            },
            timeline: vec![event_at(ts, "Departed facility")],
        }
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_provider_call() {
        let repo = Arc::new(FakeRepository::seeded(vec![parcel_with(ParcelStatus::InTransit)]));
        let provider = Arc::new(FakeProvider::returning(Vec::new()));
        let service = SyncService::new(Arc::new(FakeCredentials::default()), repo)
            .with_provider(provider.clone());

        let result =
            service.sync_active(ApiProvider::Trackingmore, &CancellationToken::new()).await;

        assert!(matches!(result, Err(PacktrailError::CredentialMissing(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_credential_counts_as_missing() {
        let repo = Arc::new(FakeRepository::seeded(vec![parcel_with(ParcelStatus::InTransit)]));
        let provider = Arc::new(FakeProvider::returning(Vec::new()));
        let credentials = FakeCredentials::with_key(ApiProvider::Trackingmore, "");
        let service =
            SyncService::new(Arc::new(credentials), repo).with_provider(provider.clone());

        let result =
            service.sync_active(ApiProvider::Trackingmore, &CancellationToken::new()).await;

        assert!(matches!(result, Err(PacktrailError::CredentialMissing(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn batch_sync_replaces_timeline_wholesale() {
        let mut parcel = parcel_with(ParcelStatus::InTransit);
        parcel.timeline =
            vec![event_at(Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap(), "Old event")];
        let parcel_id = parcel.id;

        let repo = Arc::new(FakeRepository::seeded(vec![parcel.clone()]));
        let provider =
            Arc::new(FakeProvider::returning(vec![update_for(&parcel, ParcelStatus::Delivered)]));
        let credentials = FakeCredentials::with_key(ApiProvider::Trackingmore, "secret");
        let service =
            SyncService::new(Arc::new(credentials), repo.clone()).with_provider(provider);

        let updates = service
            .sync_active(ApiProvider::Trackingmore, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(updates.len(), 1);

        let stored = repo.get(parcel_id).unwrap();
        assert_eq!(stored.status, ParcelStatus::Delivered);
        assert_eq!(stored.timeline.len(), 1);
        assert_eq!(stored.timeline[0].description, "Departed facility");
    }

    #[tokio::test]
    async fn terminal_and_archived_parcels_are_not_synced() {
        let active = parcel_with(ParcelStatus::InTransit);
        let delivered = parcel_with(ParcelStatus::Delivered);
        let mut archived = parcel_with(ParcelStatus::InTransit);
        archived.archived = true;

        let repo =
            Arc::new(FakeRepository::seeded(vec![active.clone(), delivered, archived]));
        let eligible = repo.parcels.lock().unwrap().clone();
        let names: Vec<Uuid> =
            eligible.iter().filter(|p| p.is_active()).map(|p| p.id).collect();
        assert_eq!(names, vec![active.id]);
    }

    #[tokio::test]
    async fn scraped_update_prepends_exactly_one_event() {
        let mut parcel = parcel_with(ParcelStatus::InTransit);
        parcel.timeline =
            vec![event_at(Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap(), "Old event")];
        let parcel_id = parcel.id;

        let repo = Arc::new(FakeRepository::seeded(vec![parcel]));
        let credentials = FakeCredentials::with_key(ApiProvider::Trackingmore, "secret");
        let service = SyncService::new(Arc::new(credentials), repo.clone());

        let scraped = service
            .apply_scraped(parcel_id, "Delivered: left at front desk")
            .await
            .unwrap()
            .expect("confident classification");
        assert_eq!(scraped.status, ParcelStatus::Delivered);

        let stored = repo.get(parcel_id).unwrap();
        assert_eq!(stored.status, ParcelStatus::Delivered);
        assert_eq!(stored.timeline.len(), 2);
        assert_eq!(stored.timeline[0].description, scraped.description);
        assert_eq!(stored.timeline[1].description, "Old event");
    }

    #[tokio::test]
    async fn unclassifiable_text_is_a_no_op() {
        let parcel = parcel_with(ParcelStatus::InTransit);
        let parcel_id = parcel.id;
        let repo = Arc::new(FakeRepository::seeded(vec![parcel]));
        let service =
            SyncService::new(Arc::new(FakeCredentials::default()), repo.clone());

        let outcome =
            service.apply_scraped(parcel_id, "Enter a tracking number to begin.").await.unwrap();
        assert!(outcome.is_none());

        let stored = repo.get(parcel_id).unwrap();
        assert_eq!(stored.timeline.len(), 0);
        assert_eq!(stored.status, ParcelStatus::InTransit);
    }

    #[tokio::test]
    async fn register_parcel_derives_status_and_carrier() {
        let repo = Arc::new(FakeRepository::default());
        let service = SyncService::new(Arc::new(FakeCredentials::default()), repo.clone());

        let with_tracking = service
            .register_parcel(NewParcel {
                title: " Desk lamp ".to_string(),
                tracking_number: "1Z999AA10123456784".to_string(),
                order_number: Some("ORD-1".to_string()),
                direction: ParcelDirection::Incoming,
                carrier: Carrier::Auto,
                notes: None,
                expected_delivery: None,
            })
            .await
            .unwrap();
        assert_eq!(with_tracking.status, ParcelStatus::PreShipment);
        assert_eq!(with_tracking.carrier.as_deref(), Some("UPS"));
        assert_eq!(with_tracking.title, "Desk lamp");

        let incoming = service
            .register_parcel(NewParcel {
                title: "Book".to_string(),
                tracking_number: String::new(),
                order_number: None,
                direction: ParcelDirection::Incoming,
                carrier: Carrier::Auto,
                notes: None,
                expected_delivery: None,
            })
            .await
            .unwrap();
        assert_eq!(incoming.status, ParcelStatus::Ordered);
        assert!(incoming.carrier.is_none());

        let outgoing = service
            .register_parcel(NewParcel {
                title: "Return".to_string(),
                tracking_number: String::new(),
                order_number: None,
                direction: ParcelDirection::Outgoing,
                carrier: Carrier::Auto,
                notes: None,
                expected_delivery: None,
            })
            .await
            .unwrap();
        assert_eq!(outgoing.status, ParcelStatus::Draft);
    }
}
