//! REST API client module for the CoinGecko market-data service.
//!
//! This module provides the `MarketApi` trait - the seam the catalog store
//! fetches through - and `ApiClient`, its production implementation over
//! the public CoinGecko v3 API. The API is read-only and unauthenticated.

pub mod client;
pub mod error;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CategoryEntry, CoinListEntry, MarketEntry};

pub use client::ApiClient;
pub use error::ApiError;

/// Remote market-data surface consumed by the catalog store.
///
/// Implementations are expected to make exactly one request per call and
/// surface failures on the first error - retry and cancellation policy
/// belongs to the caller.
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// Fetch the list of supported quote currency codes.
    async fn supported_currencies(&self) -> Result<Vec<String>>;

    /// Fetch the category directory.
    async fn category_list(&self) -> Result<Vec<CategoryEntry>>;

    /// Fetch the full coin listing (id, name, symbol per asset).
    async fn coin_list(&self) -> Result<Vec<CoinListEntry>>;

    /// Fetch market data for the given asset ids in one batch, quoted in
    /// `vs_currency`, including 24h volume/change and the 7-day sparkline.
    async fn market_data(&self, ids: &[String], vs_currency: &str) -> Result<Vec<MarketEntry>>;
}
