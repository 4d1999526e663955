//! Offer selection.
//!
//! Filters the catalog down to offers meeting every hard constraint, scores
//! the survivors and picks the best one. Everything here is pure: the same
//! catalog and requirements always give the same answer.
//!
//! ## Scoring
//!
//! ```text
//! price       = max(0, PRICE_WEIGHT * (1 - price / max_price))   0..=30
//! reliability = reliability * RELIABILITY_WEIGHT                 0..=15
//! score       = price + reliability                              0..=45
//! ```
//!
//! Ties keep catalog order: the earlier offer wins.

use std::cmp::Ordering;

use tracing::debug;

use crate::config::RequirementSet;
use crate::providers::Offer;

/// Points for a free offer, falling linearly to zero at the price ceiling.
pub const PRICE_WEIGHT: f64 = 30.0;

/// Points for a host with perfect reliability.
pub const RELIABILITY_WEIGHT: f64 = 15.0;

/// Why an offer was excluded.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Offer is not rentable right now.
    NotRentable,
    /// Price is above the ceiling.
    TooExpensive { price: f64, max: f64 },
    /// GPU count does not match exactly.
    GpuCount { found: u32, required: u32 },
    /// GPU model is not in the acceptable set.
    GpuName(String),
    /// Not enough free disk.
    DiskSpace { found: f64, min: f64 },
    /// Download bandwidth too low.
    InetDown { found: f64, min: f64 },
    /// Upload bandwidth too low.
    InetUp { found: f64, min: f64 },
    /// Host reliability too low.
    Reliability { found: f64, min: f64 },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRentable => write!(f, "not rentable"),
            Self::TooExpensive { price, max } => write!(f, "${price:.3}/hr > ${max:.3}/hr"),
            Self::GpuCount { found, required } => {
                write!(f, "{found} GPUs, need exactly {required}")
            }
            Self::GpuName(name) if name.is_empty() => write!(f, "no GPU model reported"),
            Self::GpuName(name) => write!(f, "GPU {name} not accepted"),
            Self::DiskSpace { found, min } => write!(f, "disk {found:.0} GB < {min:.0} GB"),
            Self::InetDown { found, min } => write!(f, "download {found:.0} < {min:.0} Mbps"),
            Self::InetUp { found, min } => write!(f, "upload {found:.0} < {min:.0} Mbps"),
            Self::Reliability { found, min } => {
                write!(f, "reliability {found:.3} < {min:.3}")
            }
        }
    }
}

/// An eligible offer with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredOffer {
    /// The offer.
    pub offer: Offer,
    /// Desirability, higher is better.
    pub score: f64,
}

/// Check one offer against every constraint.
///
/// # Errors
/// Returns the first constraint the offer fails.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub fn check_offer(offer: &Offer, req: &RequirementSet) -> Result<(), Rejection> {
    if !offer.rentable {
        return Err(Rejection::NotRentable);
    }
    // Written so NaN never passes.
    if !(offer.price_per_hour <= req.max_price_per_hour) {
        return Err(Rejection::TooExpensive {
            price: offer.price_per_hour,
            max: req.max_price_per_hour,
        });
    }
    if offer.num_gpus != req.num_gpus {
        return Err(Rejection::GpuCount {
            found: offer.num_gpus,
            required: req.num_gpus,
        });
    }
    // An unreported model never matches, even a blank entry in the set.
    if offer.gpu_name.is_empty() || !req.gpu_names.iter().any(|name| *name == offer.gpu_name) {
        return Err(Rejection::GpuName(offer.gpu_name.clone()));
    }
    if !(offer.disk_space >= req.min_disk_space) {
        return Err(Rejection::DiskSpace {
            found: offer.disk_space,
            min: req.min_disk_space,
        });
    }
    if !(offer.inet_down >= req.min_inet_down) {
        return Err(Rejection::InetDown {
            found: offer.inet_down,
            min: req.min_inet_down,
        });
    }
    if !(offer.inet_up >= req.min_inet_up) {
        return Err(Rejection::InetUp {
            found: offer.inet_up,
            min: req.min_inet_up,
        });
    }
    if !(offer.reliability >= req.min_reliability) {
        return Err(Rejection::Reliability {
            found: offer.reliability,
            min: req.min_reliability,
        });
    }
    Ok(())
}

/// Keep the offers that meet every constraint, in catalog order.
#[must_use]
pub fn filter_offers(offers: &[Offer], req: &RequirementSet) -> Vec<Offer> {
    offers
        .iter()
        .filter(|offer| match check_offer(offer, req) {
            Ok(()) => true,
            Err(reason) => {
                debug!(offer_id = %offer.id, reason = %reason, "Offer rejected");
                false
            }
        })
        .cloned()
        .collect()
}

/// Score an eligible offer.
///
/// Only meaningful for offers that passed [`check_offer`] against a
/// validated [`RequirementSet`].
#[must_use]
pub fn score_offer(offer: &Offer, req: &RequirementSet) -> f64 {
    let price_score =
        (PRICE_WEIGHT * (1.0 - offer.price_per_hour / req.max_price_per_hour)).max(0.0);
    let reliability_score = offer.reliability * RELIABILITY_WEIGHT;
    price_score + reliability_score
}

/// Filter and score the catalog, best first.
///
/// The sort is stable, so equal scores keep catalog order.
#[must_use]
pub fn rank_offers(offers: &[Offer], req: &RequirementSet) -> Vec<ScoredOffer> {
    let mut scored: Vec<ScoredOffer> = filter_offers(offers, req)
        .into_iter()
        .map(|offer| {
            let score = score_offer(&offer, req);
            ScoredOffer { offer, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    debug!(
        catalog = offers.len(),
        eligible = scored.len(),
        "Ranked offers"
    );
    scored
}

/// Pick the best offer, or `None` when nothing is eligible.
#[must_use]
pub fn select_best_offer(offers: &[Offer], req: &RequirementSet) -> Option<ScoredOffer> {
    rank_offers(offers, req).into_iter().next()
}
