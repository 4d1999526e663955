//! GPU instance selection and launch on the Vast.ai marketplace.
//!
//! This crate picks the best rentable GPU offer under user constraints and
//! launches a training container on it with credentials injected through the
//! container environment.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌─────────┐   ┌──────────┐   ┌──────────────┐
//! │ search_offers│──►│  filter  │──►│  score  │──►│  select  │──►│ build request│
//! │  (Vast API)  │   │ (hard    │   │ (price, │   │ (stable, │   │ (env without │
//! └──────────────┘   │  limits) │   │  uptime)│   │  best 1) │   │  empties)    │
//!                    └──────────┘   └─────────┘   └──────────┘   └──────┬───────┘
//!                                                                       ▼
//!                                                              ┌────────────────┐
//!                                                              │create_instance │
//!                                                              │   (Vast API)   │
//!                                                              └────────────────┘
//! ```
//!
//! Filtering, scoring, selection and request building are pure functions over
//! a fetched snapshot. Only the two marketplace calls do I/O.
//!
//! ## Example
//!
//! ```ignore
//! use vast_launcher::providers::vast::Vast;
//! use vast_launcher::{launch, LaunchOutcome, RunConfig};
//!
//! let config = RunConfig { api_key, ..RunConfig::default() };
//! let vast = Vast::new(&config.api_key)?;
//!
//! match launch(&vast, &config, false).await? {
//!     LaunchOutcome::Launched { handle, .. } => println!("instance {handle}"),
//!     LaunchOutcome::NoEligibleOffer => println!("nothing matched"),
//!     LaunchOutcome::DryRun(_) => unreachable!(),
//! }
//! ```

pub mod config;
pub mod error;
pub mod launcher;
pub mod providers;
pub mod request;
pub mod selection;

pub use config::{ConfigError, RequirementSet, RunConfig, Secrets};
pub use error::LaunchError;
pub use launcher::{launch, run_provision, run_selection, LaunchOutcome};
pub use providers::{
    InstanceHandle, InstanceSummary, LaunchRequest, Marketplace, MarketplaceError, Offer, OfferId,
};
pub use request::{build_env_vars, build_launch_request};
pub use selection::{
    check_offer, filter_offers, rank_offers, score_offer, select_best_offer, Rejection,
    ScoredOffer,
};
