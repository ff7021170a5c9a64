//! Track123 sync orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use packtrail_core::adapter::TrackingAdapter;
use packtrail_core::sync::ports::TrackingProvider;
use packtrail_domain::{ApiProvider, PacktrailError, Parcel, Result, SyncUpdate};
use reqwest::Method;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::adapter::Track123Adapter;
use super::types::{Track123Courier, Track123Envelope, Track123QueryData};
use crate::http::HttpClient;

/// Production API base.
pub const DEFAULT_BASE_URL: &str = "https://api.track123.com/gateway/open-api/tk/v2.1";

const API_KEY_HEADER: &str = "Track123-Api-Secret";
const CODE_SUCCESS: &str = "00000";
const CODE_AUTH: &str = "401";
const CODE_QUOTA: &str = "400";
/// Parameter-format complaint; proves the key was accepted.
const CODE_BAD_PARAMS: &str = "A0400";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Outcome of one query against the provider.
enum QueryOutcome {
    /// Payload ready for the adapter.
    Hit(Vec<u8>),
    /// Provider does not know this tracking number yet.
    NotRegistered,
    /// Log-and-skip failure for this parcel only.
    Transient(String),
}

/// Per-parcel sync orchestrator for Track123.
pub struct Track123Client {
    base_url: String,
    http: HttpClient,
    adapter: Track123Adapter,
}

impl Track123Client {
    /// Create a client against the production API.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different API base (tests, staging).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http =
            HttpClient::builder().timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS)).build()?;
        Ok(Self { base_url: base_url.into(), http, adapter: Track123Adapter })
    }

    fn post(&self, path: &str, api_key: &str, body: &serde_json::Value) -> reqwest::RequestBuilder {
        self.http
            .request(Method::POST, format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .header("accept", "application/json")
            .header(API_KEY_HEADER, api_key)
            .json(body)
    }

    async fn query_one(&self, tracking_number: &str, api_key: &str) -> Result<QueryOutcome> {
        let body = json!({ "trackNos": [tracking_number] });
        let response = match self.http.send(self.post("/track/query", api_key, &body)).await {
            Ok(response) => response,
            Err(e) => return Ok(QueryOutcome::Transient(e.to_string())),
        };

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return Ok(QueryOutcome::Transient(format!("unreadable body: {e}"))),
        };
        let envelope: Track123Envelope = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(e) => return Ok(QueryOutcome::Transient(format!("undecodable envelope: {e}"))),
        };

        match envelope.code.as_str() {
            CODE_SUCCESS => {
                let first = envelope
                    .data
                    .and_then(|data| serde_json::from_value::<Track123QueryData>(data).ok())
                    .and_then(|data| data.accepted)
                    .and_then(|accepted| accepted.content)
                    .and_then(|mut content| {
                        if content.is_empty() {
                            None
                        } else {
                            Some(content.remove(0))
                        }
                    });

                match first {
                    Some(value) => {
                        let raw = serde_json::to_vec(&value)
                            .map_err(|e| PacktrailError::Internal(e.to_string()))?;
                        Ok(QueryOutcome::Hit(raw))
                    }
                    // Nothing accepted: the number is not registered yet.
                    None => Ok(QueryOutcome::NotRegistered),
                }
            }
            CODE_AUTH => Err(PacktrailError::Auth("Track123 API key is invalid or missing.".into())),
            CODE_QUOTA => Err(PacktrailError::Quota(
                "Track123 quota limit reached; upgrade the current plan.".into(),
            )),
            other => Ok(QueryOutcome::Transient(format!(
                "Track123 code {other}: {}",
                envelope.msg.unwrap_or_default()
            ))),
        }
    }

    /// Ask the provider to guess the courier for a tracking number.
    async fn detect_courier(&self, tracking_number: &str, api_key: &str) -> Option<String> {
        let body = json!({ "trackNo": tracking_number });
        let response = self.http.send(self.post("/courier/detect", api_key, &body)).await.ok()?;
        let envelope: Track123Envelope = response.json().await.ok()?;
        if envelope.code != CODE_SUCCESS {
            return None;
        }
        let couriers: Vec<Track123Courier> = serde_json::from_value(envelope.data?).ok()?;
        couriers.into_iter().find_map(|courier| courier.courier_code)
    }

    /// Import a tracking number, returning true when creation succeeded.
    async fn register(
        &self,
        parcel: &Parcel,
        tracking_number: &str,
        api_key: &str,
    ) -> Result<bool> {
        let courier_code = match known_courier_code(parcel.carrier.as_deref()) {
            Some(code) => Some(code),
            None => self.detect_courier(tracking_number, api_key).await,
        };

        let mut item = json!({ "trackNo": tracking_number });
        if let Some(order_number) = parcel.order_number.as_deref().filter(|o| !o.is_empty()) {
            item["orderNo"] = json!(order_number);
        }
        if let Some(code) = courier_code {
            item["courierCode"] = json!(code);
        }
        let body = json!([item]);

        let response = match self.http.send(self.post("/track/import", api_key, &body)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(tracking_number, error = %e, "tracking import request failed");
                return Ok(false);
            }
        };
        if !response.status().is_success() {
            return Ok(false);
        }

        let envelope: Track123Envelope = match response.json().await {
            Ok(envelope) => envelope,
            Err(_) => return Ok(false),
        };
        match envelope.code.as_str() {
            CODE_SUCCESS => Ok(true),
            CODE_AUTH => Err(PacktrailError::Auth("Track123 API key is invalid or missing.".into())),
            CODE_QUOTA => Err(PacktrailError::Quota(
                "Track123 quota limit reached; upgrade the current plan.".into(),
            )),
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl TrackingProvider for Track123Client {
    fn provider(&self) -> ApiProvider {
        ApiProvider::Track123
    }

    async fn sync_parcels(
        &self,
        parcels: &[Parcel],
        api_key: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SyncUpdate>> {
        let mut results = Vec::new();

        for parcel in parcels {
            if cancel.is_cancelled() {
                info!("batch sync cancelled; returning partial results");
                break;
            }
            let Some(number) = parcel.tracking_number.as_deref().filter(|n| !n.is_empty()) else {
                continue;
            };

            // Bounded retry: one registration attempt buys exactly one
            // more query.
            let mut registered = false;
            loop {
                match self.query_one(number, api_key).await? {
                    QueryOutcome::Hit(raw) => {
                        match self.adapter.adapt(&raw, parcel) {
                            Ok(update) => results.push(update),
                            Err(e) => {
                                warn!(tracking_number = number, error = %e, "skipping parcel: payload rejected");
                            }
                        }
                        break;
                    }
                    QueryOutcome::NotRegistered if !registered => {
                        if self.register(parcel, number, api_key).await? {
                            debug!(tracking_number = number, "imported; retrying query once");
                            registered = true;
                            continue;
                        }
                        warn!(tracking_number = number, "skipping parcel: import failed");
                        break;
                    }
                    QueryOutcome::NotRegistered => {
                        warn!(tracking_number = number, "skipping parcel: still missing after import");
                        break;
                    }
                    QueryOutcome::Transient(reason) => {
                        warn!(tracking_number = number, reason, "skipping parcel");
                        break;
                    }
                }
            }
        }

        Ok(results)
    }

    async fn validate_key(&self, api_key: &str) -> Result<()> {
        if api_key.is_empty() {
            return Err(PacktrailError::CredentialMissing("API key is empty.".into()));
        }

        // Loose probe: empty paging query exercises auth without touching
        // any tracking number.
        let body = json!({ "offset": 0, "limit": 1 });
        let response = self.http.send(self.post("/track/query", api_key, &body)).await?;
        let envelope: Track123Envelope = response
            .json()
            .await
            .map_err(|e| PacktrailError::Decoding(format!("Track123 envelope: {e}")))?;

        match envelope.code.as_str() {
            CODE_SUCCESS | CODE_BAD_PARAMS => Ok(()),
            CODE_AUTH => Err(PacktrailError::Auth("API key is invalid or missing.".into())),
            CODE_QUOTA => {
                let message = envelope.msg.unwrap_or_default();
                if message.contains("quota") {
                    Err(PacktrailError::Quota(
                        "Access denied: plan expired or query limit reached.".into(),
                    ))
                } else {
                    // Parameter complaint; the key itself was accepted.
                    Ok(())
                }
            }
            _ => Err(PacktrailError::Api(
                envelope.msg.unwrap_or_else(|| "Unknown Track123 error".into()),
            )),
        }
    }
}

fn known_courier_code(carrier: Option<&str>) -> Option<String> {
    match carrier?.to_lowercase().as_str() {
        "ups" => Some("ups".to_string()),
        "fedex" => Some("fedex".to_string()),
        "usps" => Some("usps".to_string()),
        "dhl" => Some("dhl".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::Utc;
    use packtrail_domain::{ParcelDirection, ParcelStatus};
    use uuid::Uuid;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;

    fn parcel(number: &str) -> Parcel {
        let now = Utc::now();
        Parcel {
            id: Uuid::new_v4(),
            title: format!("Parcel {number}"),
            tracking_number: Some(number.to_string()),
            order_number: None,
            carrier: Some("Auto-Detect".to_string()),
            direction: ParcelDirection::Incoming,
            status: ParcelStatus::InTransit,
            archived: false,
            notes: None,
            expected_delivery: None,
            date_added: now,
            last_updated: now,
            timeline: Vec::new(),
        }
    }

    fn accepted_body(track_no: &str) -> serde_json::Value {
        json!({
            "code": "00000",
            "msg": "success",
            "data": {
                "accepted": {
                    "content": [{
                        "trackNo": track_no,
                        "transitStatus": "IN_TRANSIT",
                        "localLogisticsInfo": {
                            "trackingDetails": [
                                {"eventTime": "2026-02-19 10:00:00", "eventDetail": "Departed"}
                            ]
                        }
                    }]
                }
            }
        })
    }

    fn empty_body() -> serde_json::Value {
        json!({ "code": "00000", "msg": "success", "data": { "accepted": { "content": [] } } })
    }

    async fn client_for(server: &MockServer) -> Track123Client {
        Track123Client::with_base_url(server.uri()).expect("client")
    }

    #[tokio::test]
    async fn successful_batch_adapts_every_parcel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/track/query"))
            .and(header(API_KEY_HEADER, "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted_body("A1")))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let parcels = vec![parcel("A1"), parcel("A2")];
        let updates = client
            .sync_parcels(&parcels, "secret", &CancellationToken::new())
            .await
            .expect("batch");

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].info.entry_id, parcels[0].id);
        assert_eq!(updates[1].info.entry_id, parcels[1].id);
    }

    #[tokio::test]
    async fn invalid_key_aborts_before_remaining_parcels() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/track/query"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "code": "401", "msg": "" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let parcels: Vec<Parcel> = (0..5).map(|i| parcel(&format!("P{i}"))).collect();
        let result = client.sync_parcels(&parcels, "bad", &CancellationToken::new()).await;

        assert!(matches!(result, Err(PacktrailError::Auth(_))));
        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
    }

    #[tokio::test]
    async fn quota_exhaustion_aborts_the_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/track/query"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "code": "400", "msg": "quota" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client
            .sync_parcels(&[parcel("P1"), parcel("P2")], "secret", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(PacktrailError::Quota(_))));
    }

    #[tokio::test]
    async fn unregistered_number_is_imported_then_retried_once() {
        let server = MockServer::start().await;

        let query_hits = Arc::new(AtomicUsize::new(0));
        let hits = query_hits.clone();
        Mock::given(method("POST"))
            .and(path("/track/query"))
            .respond_with(move |_: &Request| {
                if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(200).set_body_json(empty_body())
                } else {
                    ResponseTemplate::new(200).set_body_json(accepted_body("N1"))
                }
            })
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/courier/detect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({ "code": "00000", "data": [{ "courierCode": "usps" }] }),
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/track/import"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "code": "00000", "data": {} })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let updates = client
            .sync_parcels(&[parcel("N1")], "secret", &CancellationToken::new())
            .await
            .expect("batch");

        assert_eq!(updates.len(), 1);
        assert_eq!(query_hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_import_skips_the_parcel_and_continues() {
        let server = MockServer::start().await;

        // "U1" is unknown and the import fails; "K1" succeeds.
        Mock::given(method("POST"))
            .and(path("/track/query"))
            .respond_with(move |request: &Request| {
                let body = String::from_utf8_lossy(&request.body).to_string();
                if body.contains("U1") {
                    ResponseTemplate::new(200).set_body_json(empty_body())
                } else {
                    ResponseTemplate::new(200).set_body_json(accepted_body("K1"))
                }
            })
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/courier/detect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "00000", "data": [] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/track/import"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "code": "A0400", "msg": "format error" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let parcels = vec![parcel("U1"), parcel("K1")];
        let updates = client
            .sync_parcels(&parcels, "secret", &CancellationToken::new())
            .await
            .expect("batch");

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].info.entry_id, parcels[1].id);
    }

    #[tokio::test]
    async fn transient_provider_errors_skip_only_that_parcel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/track/query"))
            .respond_with(move |request: &Request| {
                let body = String::from_utf8_lossy(&request.body).to_string();
                if body.contains("B1") {
                    ResponseTemplate::new(200)
                        .set_body_json(json!({ "code": "B0500", "msg": "hiccup" }))
                } else {
                    ResponseTemplate::new(200).set_body_json(accepted_body("G1"))
                }
            })
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let parcels = vec![parcel("B1"), parcel("G1")];
        let updates = client
            .sync_parcels(&parcels, "secret", &CancellationToken::new())
            .await
            .expect("batch");

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].info.entry_id, parcels[1].id);
    }

    #[tokio::test]
    async fn cancellation_stops_between_parcels() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/track/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(accepted_body("A1")))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let updates = client
            .sync_parcels(&[parcel("A1"), parcel("A2")], "secret", &cancel)
            .await
            .expect("batch");

        assert!(updates.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn validate_key_maps_envelope_codes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/track/query"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "code": "A0400", "msg": "" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.validate_key("secret").await.is_ok());
        assert!(matches!(
            client.validate_key("").await,
            Err(PacktrailError::CredentialMissing(_))
        ));
    }
}
