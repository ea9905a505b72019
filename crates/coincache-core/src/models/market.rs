// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// One entry of the full coin listing (`/coins/list`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinListEntry {
    pub id: String,
    pub name: String,
    pub symbol: String,
}

/// One entry of the category directory (`/coins/categories/list`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category_id: String,
    pub name: String,
}

/// One entry of a market-data batch (`/coins/markets`).
///
/// Numeric fields are optional - the API returns null for thinly traded
/// assets and for fields it has no data on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEntry {
    pub id: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub sparkline_in_7d: Option<Sparkline>,
}

/// 7-day price trend attached to a market entry when `sparkline=true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sparkline {
    #[serde(default)]
    pub price: Vec<f64>,
}
