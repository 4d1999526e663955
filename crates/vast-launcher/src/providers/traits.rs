//! Marketplace trait and common types.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during marketplace operations.
#[derive(Error, Debug)]
pub enum MarketplaceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Create call succeeded at the HTTP level, but the body carries no usable
    /// contract id. Holds the raw body.
    #[error("No contract id in create response: {0}")]
    MissingContract(String),
}

/// Marketplace-assigned offer identifier.
///
/// Vast.ai sends integers; the value is kept as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OfferId(pub String);

impl std::fmt::Display for OfferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<u64> for OfferId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for OfferId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A rentable GPU offer, as reported by the marketplace at query time.
///
/// Every constraint-relevant field is already defaulted at the catalog
/// boundary. Defaults always fail the matching constraint, so an offer with
/// missing data is never admitted by the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    /// Offer ID.
    pub id: OfferId,
    /// Total price per hour in USD. Missing: `f64::INFINITY`.
    pub price_per_hour: f64,
    /// Host reliability in `[0, 1]`. Missing: `0.0`.
    pub reliability: f64,
    /// Available disk in GB. Missing: `0.0`.
    pub disk_space: f64,
    /// GPU model (e.g., "RTX 4090"). Missing: empty.
    pub gpu_name: String,
    /// Number of GPUs. Missing: `0`.
    pub num_gpus: u32,
    /// Memory per GPU in MB. Display only.
    pub gpu_ram: f64,
    /// Download bandwidth in Mbps. Missing: `0.0`.
    pub inet_down: f64,
    /// Upload bandwidth in Mbps. Missing: `0.0`.
    pub inet_up: f64,
    /// Free-form location, when the host reports one.
    pub geolocation: Option<String>,
    /// Whether the offer can be rented right now. Missing: `false`.
    pub rentable: bool,
}

/// Handle to a launched instance (the marketplace contract id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceHandle(pub String);

impl std::fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// An instance owned by the caller.
#[derive(Debug, Clone)]
pub struct InstanceSummary {
    /// Instance (contract) ID.
    pub id: String,
    /// Actual status reported by the host (e.g., "running", "loading").
    pub status: String,
    /// GPU model.
    pub gpu_name: String,
    /// Number of GPUs.
    pub num_gpus: u32,
    /// Total price per hour in USD.
    pub price_per_hour: f64,
    /// When the instance was started.
    pub started_at: Option<DateTime<Utc>>,
}

/// Request to launch a container on an offer.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchRequest {
    /// Offer to rent.
    pub offer_id: OfferId,
    /// Container image reference.
    pub image: String,
    /// Disk allocation in GB.
    pub disk: f64,
    /// Command run when the container starts.
    pub onstart: String,
    /// Environment passed to the container. Never holds empty values.
    pub env: BTreeMap<String, String>,
}

/// Trait for GPU rental marketplaces.
#[async_trait]
pub trait Marketplace: Send + Sync {
    /// Fetch the current offer catalog.
    async fn search_offers(&self) -> Result<Vec<Offer>, MarketplaceError>;

    /// Submit a launch request. Called at most once per run.
    async fn create_instance(
        &self,
        req: &LaunchRequest,
    ) -> Result<InstanceHandle, MarketplaceError>;

    /// List instances owned by the caller.
    async fn list_instances(&self) -> Result<Vec<InstanceSummary>, MarketplaceError>;
}
