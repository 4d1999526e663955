//! Vast.ai marketplace provider.
//!
//! Implements the [`Marketplace`] trait against the Vast.ai REST API
//! (`https://console.vast.ai/api/v0`).
//!
//! ## Example
//!
//! ```ignore
//! use vast_launcher::providers::vast::Vast;
//! use vast_launcher::providers::Marketplace;
//!
//! let vast = Vast::new(api_key)?;
//!
//! // Fetch the offer catalog
//! let offers = vast.search_offers().await?;
//!
//! // List running instances
//! let instances = vast.list_instances().await?;
//! ```
//!
//! [`Marketplace`]: crate::providers::Marketplace

mod client;
mod models;

pub use client::{Vast, API_BASE_URL};
pub use models::*;
