//! HTTP client for the CoinGecko v3 REST API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{CategoryEntry, CoinListEntry, MarketEntry};

use super::{ApiError, MarketApi};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the public CoinGecko v3 API
const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Page size for market-data batches. 250 is the API maximum, so one
/// request covers any realistic candidate set.
const MARKETS_PER_PAGE: u32 = 250;

/// API client for CoinGecko.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client against the public CoinGecko endpoint
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a different base URL (proxy or test server)
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}

#[async_trait]
impl MarketApi for ApiClient {
    async fn supported_currencies(&self) -> Result<Vec<String>> {
        let currencies: Vec<String> = self.get("/simple/supported_vs_currencies", &[]).await?;
        debug!(count = currencies.len(), "Supported currencies fetched");
        Ok(currencies)
    }

    async fn category_list(&self) -> Result<Vec<CategoryEntry>> {
        let categories: Vec<CategoryEntry> = self.get("/coins/categories/list", &[]).await?;
        debug!(count = categories.len(), "Category directory fetched");
        Ok(categories)
    }

    async fn coin_list(&self) -> Result<Vec<CoinListEntry>> {
        let coins: Vec<CoinListEntry> = self.get("/coins/list", &[]).await?;
        debug!(count = coins.len(), "Coin listing fetched");
        Ok(coins)
    }

    async fn market_data(&self, ids: &[String], vs_currency: &str) -> Result<Vec<MarketEntry>> {
        let query = [
            ("ids", ids.join(",")),
            ("vs_currency", vs_currency.to_string()),
            ("per_page", MARKETS_PER_PAGE.to_string()),
            ("include_24h_vol", "true".to_string()),
            ("include_24hr_change", "true".to_string()),
            ("include_last_updated_at", "true".to_string()),
            ("sparkline", "true".to_string()),
        ];

        let entries: Vec<MarketEntry> = self.get("/coins/markets", &query).await?;
        debug!(requested = ids.len(), received = entries.len(), currency = vs_currency, "Market data fetched");
        Ok(entries)
    }
}
