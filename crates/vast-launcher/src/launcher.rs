//! Selection and provisioning runs.
//!
//! [`launch`] drives one full run: validate, fetch, select, build, submit.
//! Nothing is retried and nothing is kept between runs.

use tracing::{info, warn};

use crate::config::{RequirementSet, RunConfig};
use crate::error::LaunchError;
use crate::providers::{InstanceHandle, Marketplace, Offer};
use crate::request::build_launch_request;
use crate::selection::{select_best_offer, ScoredOffer};

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchOutcome {
    /// No offer met the requirements.
    NoEligibleOffer,
    /// An offer was selected, but creation was skipped.
    DryRun(ScoredOffer),
    /// An instance was created on the selected offer.
    Launched {
        /// The selected offer.
        offer: ScoredOffer,
        /// The new instance.
        handle: InstanceHandle,
    },
}

/// Select the best offer from an already-fetched catalog.
///
/// `req` must have passed [`RequirementSet::validate`].
#[must_use]
pub fn run_selection(req: &RequirementSet, catalog: &[Offer]) -> Option<ScoredOffer> {
    select_best_offer(catalog, req)
}

/// Launch the configured workload on `offer`.
///
/// # Errors
/// Returns [`LaunchError::Submission`] with the marketplace diagnostic verbatim.
pub async fn run_provision<M: Marketplace + ?Sized>(
    market: &M,
    offer: &Offer,
    config: &RunConfig,
) -> Result<InstanceHandle, LaunchError> {
    let request = build_launch_request(offer, config);
    info!(
        offer_id = %request.offer_id,
        image = %request.image,
        config_file = %config.config_file,
        env_keys = request.env.len(),
        "Submitting launch request"
    );

    market
        .create_instance(&request)
        .await
        .map_err(LaunchError::Submission)
}

/// Run the whole pipeline once.
///
/// With `dry_run`, stops after selection and never calls
/// [`Marketplace::create_instance`].
///
/// # Errors
/// Returns an error if the configuration is invalid, the catalog cannot be
/// fetched, or the launch fails.
pub async fn launch<M: Marketplace + ?Sized>(
    market: &M,
    config: &RunConfig,
    dry_run: bool,
) -> Result<LaunchOutcome, LaunchError> {
    if dry_run {
        config.validate()?;
    } else {
        config.validate_for_launch()?;
    }

    info!("Searching for offers");
    let catalog = market
        .search_offers()
        .await
        .map_err(LaunchError::CatalogFetch)?;
    info!(total = catalog.len(), "Fetched offers");

    let Some(best) = run_selection(&config.requirements, &catalog) else {
        warn!("No offers match the requirements");
        return Ok(LaunchOutcome::NoEligibleOffer);
    };

    info!(
        offer_id = %best.offer.id,
        gpu = %best.offer.gpu_name,
        price_per_hour = best.offer.price_per_hour,
        score = best.score,
        "Selected offer"
    );

    if dry_run {
        info!("Dry run, skipping instance creation");
        return Ok(LaunchOutcome::DryRun(best));
    }

    let handle = run_provision(market, &best.offer, config).await?;
    Ok(LaunchOutcome::Launched {
        offer: best,
        handle,
    })
}
