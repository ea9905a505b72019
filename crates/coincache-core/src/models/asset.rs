use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::market::{CoinListEntry, MarketEntry};

/// Price data for one asset in one quote currency, as of the last
/// successful market-data refresh for that currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub current_price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
    pub price_change_24h: f64,
}

impl PriceSnapshot {
    fn from_market_entry(entry: &MarketEntry) -> Self {
        Self {
            current_price: entry.current_price.unwrap_or_default(),
            market_cap: entry.market_cap.unwrap_or_default(),
            total_volume: entry.total_volume.unwrap_or_default(),
            price_change_24h: entry.price_change_24h.unwrap_or_default(),
        }
    }
}

/// The central catalog entity, keyed by a stable slug id.
///
/// `id`, `name` and `symbol` are captured once from the coin listing.
/// `image` and `sparkline_7d` arrive with the first market-data refresh.
/// `prices_by_currency` grows one entry per quote currency and is never
/// cleared when the active currency changes, so switching back to a
/// previously seen currency needs no refetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub sparkline_7d: Option<Vec<f64>>,
    #[serde(default)]
    pub prices_by_currency: HashMap<String, PriceSnapshot>,
}

impl AssetRecord {
    pub fn from_listing(entry: CoinListEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            symbol: entry.symbol,
            image: None,
            sparkline_7d: None,
            prices_by_currency: HashMap::new(),
        }
    }

    pub fn price_for(&self, currency: &str) -> Option<&PriceSnapshot> {
        self.prices_by_currency.get(currency)
    }

    pub fn has_price_for(&self, currency: &str) -> bool {
        self.prices_by_currency.contains_key(currency)
    }

    /// Merge one market-data entry into this record for the given currency.
    ///
    /// Image and sparkline are overwritten every time; the snapshot is set
    /// for `currency` only, other currencies' snapshots are left alone.
    pub fn apply_market_entry(&mut self, entry: &MarketEntry, currency: &str) {
        self.image = entry.image.clone();
        self.sparkline_7d = entry.sparkline_in_7d.as_ref().map(|s| s.price.clone());
        self.prices_by_currency
            .insert(currency.to_string(), PriceSnapshot::from_market_entry(entry));
    }

    /// Metadata-only projection used when an asset is pinned as a favorite.
    pub fn reduced(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            image: None,
            sparkline_7d: None,
            prices_by_currency: HashMap::new(),
        }
    }
}
