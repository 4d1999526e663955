//! Vast.ai REST API models.
//!
//! Every field on the read side is optional. The marketplace is not trusted to
//! send complete records; defaults are applied when converting to [`Offer`].
//!
//! [`Offer`]: crate::providers::Offer

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Common types
// ============================================================================

/// Identifier that may arrive as a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    /// Numeric ID (the usual Vast.ai form).
    Number(u64),
    /// String ID.
    Text(String),
}

impl std::fmt::Display for RawId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// Offer (bundle) types
// ============================================================================

/// Response from `GET /bundles/`.
///
/// Offers are kept as raw JSON so one malformed record does not fail the
/// whole catalog.
#[derive(Debug, Deserialize)]
pub struct OffersResponse {
    /// Raw offer records.
    #[serde(default)]
    pub offers: Vec<serde_json::Value>,
}

/// One offer record as returned by the bundles endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct OfferRecord {
    /// Offer ID.
    pub id: Option<RawId>,
    /// Total dollars per hour.
    pub dph_total: Option<f64>,
    /// Host reliability score (0-1).
    pub reliability2: Option<f64>,
    /// Available disk in GB.
    pub disk_space: Option<f64>,
    /// GPU model name.
    pub gpu_name: Option<String>,
    /// GPU count.
    pub num_gpus: Option<u32>,
    /// Memory per GPU in MB.
    pub gpu_ram: Option<f64>,
    /// Download bandwidth in Mbps.
    pub inet_down: Option<f64>,
    /// Upload bandwidth in Mbps.
    pub inet_up: Option<f64>,
    /// Host location.
    pub geolocation: Option<String>,
    /// Whether the offer is currently rentable.
    pub rentable: Option<bool>,
}

// ============================================================================
// Instance types
// ============================================================================

/// Response from `GET /instances/`.
///
/// Kept as raw JSON for the same reason as [`OffersResponse`].
#[derive(Debug, Deserialize)]
pub struct InstancesResponse {
    /// Raw instance records.
    #[serde(default)]
    pub instances: Vec<serde_json::Value>,
}

/// Instance record.
#[derive(Debug, Deserialize)]
pub struct InstanceRecord {
    /// Instance ID.
    pub id: Option<RawId>,
    /// Actual status (e.g., "running", "loading", "exited").
    pub actual_status: Option<String>,
    /// GPU model name.
    pub gpu_name: Option<String>,
    /// GPU count.
    pub num_gpus: Option<u32>,
    /// Total dollars per hour.
    pub dph_total: Option<f64>,
    /// Start time as Unix seconds.
    pub start_date: Option<f64>,
}

/// Request body for `PUT /asks/{id}/`.
#[derive(Debug, Serialize)]
pub struct CreateInstanceBody {
    /// Always `me`.
    pub client_id: String,
    /// Docker image.
    pub image: String,
    /// Disk size in GB.
    pub disk: f64,
    /// Startup command.
    pub onstart: String,
    /// Container environment.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Response from `PUT /asks/{id}/`.
#[derive(Debug, Deserialize)]
pub struct CreateInstanceResponse {
    /// Whether the request succeeded.
    pub success: Option<bool>,
    /// New contract (instance) ID.
    pub new_contract: Option<RawId>,
}
