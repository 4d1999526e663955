//! Vast.ai API client implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::models::{
    CreateInstanceBody, CreateInstanceResponse, InstanceRecord, InstancesResponse, OfferRecord,
    OffersResponse,
};
use crate::providers::traits::{
    InstanceHandle, InstanceSummary, LaunchRequest, Marketplace, MarketplaceError, Offer, OfferId,
};

/// Base URL for the Vast.ai API.
pub const API_BASE_URL: &str = "https://console.vast.ai/api/v0";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Vast.ai marketplace client.
#[derive(Clone)]
pub struct Vast {
    /// HTTP client.
    client: Client,
    /// API key, sent as the `api_key` query parameter.
    api_key: String,
    /// API base URL without trailing slash.
    base_url: String,
}

impl Vast {
    /// Create a new Vast.ai client.
    ///
    /// The key is not checked here; [`RunConfig::validate`] reports it along
    /// with any other missing credential.
    ///
    /// [`RunConfig::validate`]: crate::config::RunConfig::validate
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self, MarketplaceError> {
        Self::with_base_url(api_key, API_BASE_URL)
    }

    /// Create a client against a different API root.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, MarketplaceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Make an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MarketplaceError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let text = Self::check_response(response).await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, body = %text, "Failed to parse response");
            MarketplaceError::Serialization(e)
        })
    }

    /// Make an authenticated PUT request and return the raw body.
    async fn put<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, MarketplaceError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "PUT request");

        let response = self
            .client
            .put(&url)
            .header("Accept", "application/json")
            .query(&[("api_key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        Self::check_response(response).await
    }

    /// Return the body of a successful response, or the error body verbatim.
    async fn check_response(response: reqwest::Response) -> Result<String, MarketplaceError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(text)
        } else {
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                warn!(status = status.as_u16(), "Vast.ai rejected the API key");
            }
            Err(MarketplaceError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    /// Convert a raw offer record into an [`Offer`].
    ///
    /// Returns `None` when the record has no ID, since it could never be
    /// launched. Non-finite or negative numbers count as missing, and so does
    /// a reliability above 1.
    fn to_offer(record: OfferRecord) -> Option<Offer> {
        let id = OfferId(record.id?.to_string());

        let measure = |v: Option<f64>| v.filter(|x| x.is_finite() && *x >= 0.0);

        Some(Offer {
            id,
            price_per_hour: measure(record.dph_total).unwrap_or(f64::INFINITY),
            reliability: measure(record.reliability2)
                .filter(|r| *r <= 1.0)
                .unwrap_or(0.0),
            disk_space: measure(record.disk_space).unwrap_or(0.0),
            gpu_name: record.gpu_name.unwrap_or_default(),
            num_gpus: record.num_gpus.unwrap_or(0),
            gpu_ram: measure(record.gpu_ram).unwrap_or(0.0),
            inet_down: measure(record.inet_down).unwrap_or(0.0),
            inet_up: measure(record.inet_up).unwrap_or(0.0),
            geolocation: record.geolocation.filter(|g| !g.trim().is_empty()),
            rentable: record.rentable.unwrap_or(false),
        })
    }

    /// Convert an instance record into an [`InstanceSummary`].
    fn to_instance_summary(record: InstanceRecord) -> InstanceSummary {
        #[allow(clippy::cast_possible_truncation)]
        let started_at = record
            .start_date
            .filter(|s| s.is_finite())
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0));

        InstanceSummary {
            id: record.id.map(|id| id.to_string()).unwrap_or_default(),
            status: record
                .actual_status
                .unwrap_or_else(|| "unknown".to_string()),
            gpu_name: record.gpu_name.unwrap_or_else(|| "?".to_string()),
            num_gpus: record.num_gpus.unwrap_or(0),
            price_per_hour: record.dph_total.unwrap_or(0.0),
            started_at,
        }
    }
}

#[async_trait]
impl Marketplace for Vast {
    async fn search_offers(&self) -> Result<Vec<Offer>, MarketplaceError> {
        let response: OffersResponse = self.get("/bundles/", &[]).await?;
        let total = response.offers.len();

        let offers: Vec<Offer> = response
            .offers
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<OfferRecord>(raw) {
                Ok(record) => {
                    let offer = Self::to_offer(record);
                    if offer.is_none() {
                        warn!("Skipping offer without an id");
                    }
                    offer
                }
                Err(e) => {
                    warn!(error = %e, "Skipping malformed offer record");
                    None
                }
            })
            .collect();

        debug!(total, usable = offers.len(), "Fetched offer catalog");
        Ok(offers)
    }

    async fn create_instance(
        &self,
        req: &LaunchRequest,
    ) -> Result<InstanceHandle, MarketplaceError> {
        info!(offer_id = %req.offer_id, image = %req.image, disk = req.disk, "Creating instance");

        let body = CreateInstanceBody {
            client_id: "me".to_string(),
            image: req.image.clone(),
            disk: req.disk,
            onstart: req.onstart.clone(),
            env: req.env.clone(),
        };

        let text = self.put(&format!("/asks/{}/", req.offer_id), &body).await?;
        let response: CreateInstanceResponse = match serde_json::from_str(&text) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, body = %text, "Failed to parse create response");
                return Err(MarketplaceError::MissingContract(text));
            }
        };

        let Some(contract) = response.new_contract else {
            return Err(MarketplaceError::MissingContract(text));
        };
        if response.success == Some(false) {
            return Err(MarketplaceError::MissingContract(text));
        }

        let handle = InstanceHandle(contract.to_string());
        info!(offer_id = %req.offer_id, instance_id = %handle, "Instance created");
        Ok(handle)
    }

    async fn list_instances(&self) -> Result<Vec<InstanceSummary>, MarketplaceError> {
        let response: InstancesResponse = self.get("/instances/", &[("owner", "me")]).await?;
        let total = response.instances.len();

        let instances: Vec<InstanceSummary> = response
            .instances
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<InstanceRecord>(raw) {
                Ok(record) => Some(Self::to_instance_summary(record)),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed instance record");
                    None
                }
            })
            .collect();

        debug!(total, usable = instances.len(), "Fetched instances");
        Ok(instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::vast::RawId;

    #[test]
    fn test_to_offer_defaults_exclude() {
        let offer = Vast::to_offer(OfferRecord {
            id: Some(RawId::Number(42)),
            ..OfferRecord::default()
        })
        .unwrap();

        assert_eq!(offer.id, OfferId::from(42));
        assert!(offer.price_per_hour.is_infinite());
        assert_eq!(offer.num_gpus, 0);
        assert!(offer.gpu_name.is_empty());
        assert!(!offer.rentable);
        assert!(offer.geolocation.is_none());
    }

    #[test]
    fn test_to_offer_without_id_is_dropped() {
        assert!(Vast::to_offer(OfferRecord::default()).is_none());
    }

    #[test]
    fn test_to_offer_negative_price_treated_as_missing() {
        let offer = Vast::to_offer(OfferRecord {
            id: Some(RawId::Text("abc".to_string())),
            dph_total: Some(-1.0),
            inet_up: Some(-5.0),
            ..OfferRecord::default()
        })
        .unwrap();

        assert_eq!(offer.id.0, "abc");
        assert!(offer.price_per_hour.is_infinite());
        assert!(offer.inet_up.abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_offer_reliability_above_one_treated_as_missing() {
        let offer = Vast::to_offer(OfferRecord {
            id: Some(RawId::Number(9)),
            dph_total: Some(1.9),
            reliability2: Some(4.0),
            ..OfferRecord::default()
        })
        .unwrap();
        assert!(offer.reliability.abs() < f64::EPSILON);

        let offer = Vast::to_offer(OfferRecord {
            id: Some(RawId::Number(10)),
            reliability2: Some(1.0),
            ..OfferRecord::default()
        })
        .unwrap();
        assert!((offer.reliability - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_api_key_left_to_config_validation() {
        assert!(Vast::new("").is_ok());
    }

    #[test]
    fn test_instance_summary_start_date() {
        let summary = Vast::to_instance_summary(InstanceRecord {
            id: Some(RawId::Number(7)),
            actual_status: None,
            gpu_name: None,
            num_gpus: Some(2),
            dph_total: Some(0.4),
            start_date: Some(1_700_000_000.5),
        });

        assert_eq!(summary.id, "7");
        assert_eq!(summary.status, "unknown");
        assert_eq!(summary.gpu_name, "?");
        assert_eq!(
            summary.started_at.map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }
}
