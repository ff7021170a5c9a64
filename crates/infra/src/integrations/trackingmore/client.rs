//! Trackingmore sync orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use packtrail_core::adapter::TrackingAdapter;
use packtrail_core::sync::ports::TrackingProvider;
use packtrail_domain::{ApiProvider, PacktrailError, Parcel, Result, SyncUpdate};
use reqwest::Method;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::adapter::TrackingmoreAdapter;
use super::types::{TrackingmoreCourier, TrackingmoreEnvelope};
use crate::http::HttpClient;

/// Production API base.
pub const DEFAULT_BASE_URL: &str = "https://api.trackingmore.com/v4";

const API_KEY_HEADER: &str = "Tracking-Api-Key";

const META_SUCCESS: i64 = 200;
const META_AUTH: i64 = 4011;
const META_QUOTA: i64 = 4031;
const META_ALREADY_EXISTS: i64 = 4101;
const META_NOT_FOUND: i64 = 4102;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Outcome of one query against the provider.
enum QueryOutcome {
    /// Re-wrapped `{meta, data}` payload ready for the strict adapter.
    Hit(Vec<u8>),
    /// Provider does not know this tracking number yet.
    NotRegistered,
    /// Log-and-skip failure for this parcel only.
    Transient(String),
}

/// Per-parcel sync orchestrator for Trackingmore v4.
pub struct TrackingmoreClient {
    base_url: String,
    http: HttpClient,
    adapter: TrackingmoreAdapter,
}

impl TrackingmoreClient {
    /// Create a client against the production API.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different API base (tests, staging).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http =
            HttpClient::builder().timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS)).build()?;
        Ok(Self { base_url: base_url.into(), http, adapter: TrackingmoreAdapter })
    }

    fn request(&self, method: Method, path: &str, api_key: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .header(API_KEY_HEADER, api_key)
    }

    /// Map a batch-fatal meta code to its error, if it is one.
    fn fatal_for(code: i64) -> Option<PacktrailError> {
        match code {
            META_AUTH => {
                Some(PacktrailError::Auth("Trackingmore API key is invalid or missing.".into()))
            }
            META_QUOTA => Some(PacktrailError::Quota(
                "Access denied: plan expired or query limit reached.".into(),
            )),
            _ => None,
        }
    }

    async fn query_one(&self, tracking_number: &str, api_key: &str) -> Result<QueryOutcome> {
        let request = self
            .request(Method::GET, "/trackings/get", api_key)
            .query(&[("tracking_numbers", tracking_number)]);
        let response = match self.http.send(request).await {
            Ok(response) => response,
            Err(e) => return Ok(QueryOutcome::Transient(e.to_string())),
        };
        if !response.status().is_success() {
            return Ok(QueryOutcome::Transient(format!(
                "server returned {}",
                response.status()
            )));
        }

        let envelope: TrackingmoreEnvelope = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) => return Ok(QueryOutcome::Transient(format!("undecodable envelope: {e}"))),
        };

        if let Some(fatal) = Self::fatal_for(envelope.meta.code) {
            return Err(fatal);
        }
        match envelope.meta.code {
            META_SUCCESS => {
                let first = envelope
                    .data
                    .and_then(|data| match data {
                        serde_json::Value::Array(mut items) if !items.is_empty() => {
                            Some(items.remove(0))
                        }
                        _ => None,
                    });

                match first {
                    Some(value) => {
                        // The strict adapter expects one object under
                        // `data`, so the array element is re-wrapped with
                        // the original meta.
                        let rewrapped = json!({ "meta": envelope.meta, "data": value });
                        let raw = serde_json::to_vec(&rewrapped)
                            .map_err(|e| PacktrailError::Internal(e.to_string()))?;
                        Ok(QueryOutcome::Hit(raw))
                    }
                    None => Ok(QueryOutcome::NotRegistered),
                }
            }
            META_NOT_FOUND => Ok(QueryOutcome::NotRegistered),
            other => Ok(QueryOutcome::Transient(format!(
                "Trackingmore meta code {other}: {}",
                envelope.meta.message.unwrap_or_default()
            ))),
        }
    }

    /// Ask the provider to guess the courier for a tracking number.
    async fn detect_courier(&self, tracking_number: &str, api_key: &str) -> Option<String> {
        let request = self
            .request(Method::POST, "/couriers/detect", api_key)
            .json(&json!({ "tracking_number": tracking_number }));
        let response = self.http.send(request).await.ok()?;
        let envelope: TrackingmoreEnvelope = response.json().await.ok()?;
        if envelope.meta.code != META_SUCCESS {
            return None;
        }
        let couriers: Vec<TrackingmoreCourier> = serde_json::from_value(envelope.data?).ok()?;
        couriers.into_iter().find_map(|courier| courier.courier_code)
    }

    /// Create a tracking, returning true when the number is registered
    /// afterwards (freshly created or an existing registration).
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

        let mut body = json!({ "tracking_number": tracking_number });
        if let Some(code) = courier_code {
            body["courier_code"] = json!(code);
        }
        if let Some(order_number) = parcel.order_number.as_deref().filter(|o| !o.is_empty()) {
            body["order_number"] = json!(order_number);
        }

        let request = self.request(Method::POST, "/trackings/create", api_key).json(&body);
        let response = match self.http.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(tracking_number, error = %e, "tracking create request failed");
                return Ok(false);
            }
        };

        let envelope: TrackingmoreEnvelope = match response.json().await {
            Ok(envelope) => envelope,
            Err(_) => return Ok(false),
        };
        if let Some(fatal) = Self::fatal_for(envelope.meta.code) {
            return Err(fatal);
        }
        Ok(matches!(envelope.meta.code, META_SUCCESS | META_ALREADY_EXISTS))
    }
}

#[async_trait]
impl TrackingProvider for TrackingmoreClient {
    fn provider(&self) -> ApiProvider {
        ApiProvider::Trackingmore
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
                            debug!(tracking_number = number, "created; retrying query once");
                            registered = true;
                            continue;
                        }
                        warn!(tracking_number = number, "skipping parcel: create failed");
                        break;
                    }
                    QueryOutcome::NotRegistered => {
                        warn!(tracking_number = number, "skipping parcel: still missing after create");
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

        let request = self.request(Method::GET, "/trackings/get", api_key);
        let response = self.http.send(request).await?;
        let envelope: TrackingmoreEnvelope = response
            .json()
            .await
            .map_err(|e| PacktrailError::Decoding(format!("Trackingmore envelope: {e}")))?;

        if let Some(fatal) = Self::fatal_for(envelope.meta.code) {
            return Err(fatal);
        }
        match envelope.meta.code {
            META_SUCCESS => Ok(()),
            // Parameter complaints still prove the key was accepted.
            code if (4000..5000).contains(&code) => Ok(()),
            code => Err(PacktrailError::Api(format!(
                "Trackingmore error {code}: {}",
                envelope.meta.message.unwrap_or_default()
            ))),
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
