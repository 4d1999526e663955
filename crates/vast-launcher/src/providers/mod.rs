//! Marketplace implementations.
//!
//! This module contains the [`Marketplace`] trait and the Vast.ai client.

pub mod traits;
pub mod vast;

pub use traits::{
    InstanceHandle, InstanceSummary, LaunchRequest, Marketplace, MarketplaceError, Offer, OfferId,
};
