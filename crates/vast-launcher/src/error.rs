//! Error types for a launch run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::providers::MarketplaceError;

/// Errors that end a run.
///
/// Finding no eligible offer is not one of them; see
/// [`LaunchOutcome::NoEligibleOffer`](crate::launcher::LaunchOutcome::NoEligibleOffer).
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration is invalid. Raised before any network call.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The offer catalog could not be fetched.
    #[error("Offer search failed: {0}")]
    CatalogFetch(#[source] MarketplaceError),

    /// The marketplace refused or failed the launch.
    #[error("Instance creation failed: {0}")]
    Submission(#[source] MarketplaceError),
}
