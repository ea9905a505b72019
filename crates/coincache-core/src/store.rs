//! The catalog store - in-memory market state and its synchronization rules.
//!
//! `CatalogStore` owns four sub-stores sharing the asset id as key: the
//! currency and category directories, the asset catalog, and the favorites
//! set. Bootstrap loaders fill the directories and catalog once per
//! session, preferring the durable cache over the network; price refreshes
//! enrich a candidate subset in the active currency without ever touching
//! snapshots already held for other currencies.
//!
//! The store is a plain injected object with a single owner. All
//! network-facing operations take `&mut self`, so overlapping mutations of
//! one store are ruled out by the borrow checker rather than a lock.

use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::MarketApi;
use crate::cache::{CacheAges, CacheManager};
use crate::models::{AssetRecord, Category};

/// Quote currency used when neither durable storage nor configuration
/// provides one.
pub const DEFAULT_CURRENCY: &str = "eur";

/// Change notification delivered to subscribers after each mutation.
/// Delivery is best-effort; consumers read current state through the
/// accessors rather than reconstructing it from events.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// Currency directory populated (count)
    CurrenciesLoaded(usize),
    /// Category directory populated (count)
    CategoriesLoaded(usize),
    /// Asset catalog populated (count)
    AssetsLoaded(usize),
    /// Price snapshots merged for the listed asset ids
    PricesUpdated(Vec<String>),
    /// Active quote currency switched
    CurrencyChanged(String),
    /// Asset pinned as favorite
    FavoriteAdded(String),
    /// Asset unpinned
    FavoriteRemoved(String),
}

pub struct CatalogStore {
    api: Box<dyn MarketApi>,
    cache: CacheManager,

    currencies: Vec<String>,
    categories: Vec<Category>,
    assets: HashMap<String, AssetRecord>,
    favorites: HashMap<String, AssetRecord>,
    active_currency: String,

    subscribers: Vec<mpsc::UnboundedSender<StoreEvent>>,
}

impl CatalogStore {
    /// Create a store over the given API and cache. Favorites and the
    /// active currency are restored from durable storage immediately;
    /// `fallback_currency` applies only when storage holds no choice.
    pub fn new(api: Box<dyn MarketApi>, cache: CacheManager, fallback_currency: &str) -> Self {
        let favorites: HashMap<String, AssetRecord> = cache
            .load_favorites()
            .map(|cached| cached.data.into_iter().collect())
            .unwrap_or_default();

        let active_currency = cache
            .load_active_currency()
            .map(|cached| cached.data)
            .filter(|currency| !currency.is_empty())
            .unwrap_or_else(|| fallback_currency.to_string());

        Self {
            api,
            cache,
            currencies: Vec::new(),
            categories: Vec::new(),
            assets: HashMap::new(),
            favorites,
            active_currency,
            subscribers: Vec::new(),
        }
    }

    // =========================================================================
    // Bootstrap loaders
    // =========================================================================

    /// Populate the currency directory. No-op once non-empty; otherwise the
    /// durable cache wins over the network.
    pub async fn load_currencies(&mut self) -> Result<()> {
        if !self.currencies.is_empty() {
            return Ok(());
        }

        if let Some(cached) = self.cache.load_currencies() {
            if !cached.data.is_empty() {
                debug!(count = cached.data.len(), age = %cached.age_display(), "Currency directory hydrated from cache");
                self.currencies = cached.data;
                self.emit(StoreEvent::CurrenciesLoaded(self.currencies.len()));
                return Ok(());
            }
        }

        let fetched = self.api.supported_currencies().await?;
        if !fetched.is_empty() {
            self.cache.save_currencies(&fetched);
            self.currencies = fetched;
            self.emit(StoreEvent::CurrenciesLoaded(self.currencies.len()));
        }
        Ok(())
    }

    /// Populate the category directory, mapping the remote
    /// `{category_id, name}` shape to `Category`.
    pub async fn load_categories(&mut self) -> Result<()> {
        if !self.categories.is_empty() {
            return Ok(());
        }

        if let Some(cached) = self.cache.load_categories() {
            if !cached.data.is_empty() {
                debug!(count = cached.data.len(), age = %cached.age_display(), "Category directory hydrated from cache");
                self.categories = cached.data;
                self.emit(StoreEvent::CategoriesLoaded(self.categories.len()));
                return Ok(());
            }
        }

        let fetched = self.api.category_list().await?;
        if !fetched.is_empty() {
            self.categories = fetched.into_iter().map(Category::from).collect();
            self.cache.save_categories(&self.categories);
            self.emit(StoreEvent::CategoriesLoaded(self.categories.len()));
        }
        Ok(())
    }

    /// Populate the asset catalog. Hydration from cache is metadata-only:
    /// every record's price map is reset to empty, since the durable
    /// catalog stores the enriched shape but snapshots are only trusted
    /// within the session that fetched them.
    pub async fn load_assets(&mut self) -> Result<()> {
        if !self.assets.is_empty() {
            return Ok(());
        }

        if let Some(cached) = self.cache.load_assets() {
            if !cached.data.is_empty() {
                debug!(count = cached.data.len(), age = %cached.age_display(), "Asset catalog hydrated from cache");
                for (_, mut record) in cached.data {
                    record.prices_by_currency.clear();
                    self.assets.insert(record.id.clone(), record);
                }
                self.emit(StoreEvent::AssetsLoaded(self.assets.len()));
                return Ok(());
            }
        }

        let fetched = self.api.coin_list().await?;
        if !fetched.is_empty() {
            for entry in fetched {
                let record = AssetRecord::from_listing(entry);
                self.assets.insert(record.id.clone(), record);
            }
            self.cache.save_assets(&self.assets);
            self.emit(StoreEvent::AssetsLoaded(self.assets.len()));
        }
        Ok(())
    }

    // =========================================================================
    // Price enrichment
    // =========================================================================

    /// Refresh market data for the candidate ids in the active currency.
    ///
    /// Candidates already holding a snapshot for the active currency are
    /// skipped, as are ids with no catalog record; if nothing is left the
    /// call returns without issuing a request. The batch response is fully
    /// received and decoded before any record is mutated, so a failed
    /// request commits nothing. Ids the response does not cover stay
    /// unpriced and are picked up again by the next call.
    pub async fn refresh_prices(&mut self, candidate_ids: &[String]) -> Result<()> {
        let request_ids: Vec<String> = candidate_ids
            .iter()
            .filter(|id| {
                self.assets
                    .get(id.as_str())
                    .map(|record| !record.has_price_for(&self.active_currency))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        if request_ids.is_empty() {
            debug!(currency = %self.active_currency, "All candidates already priced, skipping fetch");
            return Ok(());
        }

        let entries = self.api.market_data(&request_ids, &self.active_currency).await?;

        let active = self.active_currency.clone();
        let mut updated = Vec::new();
        for entry in &entries {
            if let Some(record) = self.assets.get_mut(&entry.id) {
                record.apply_market_entry(entry, &active);
                // A pinned asset tracks the catalog record wholesale once
                // enrichment touches it; the durable favorites set is only
                // written by add/remove.
                if self.favorites.contains_key(&entry.id) {
                    self.favorites.insert(entry.id.clone(), record.clone());
                }
                updated.push(entry.id.clone());
            }
        }

        if !updated.is_empty() {
            self.emit(StoreEvent::PricesUpdated(updated));
        }
        Ok(())
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Pin an asset. The stored entry is a metadata-only projection; it
    /// picks up price data when a later refresh touches the same id.
    pub fn add_favorite(&mut self, asset: &AssetRecord) {
        self.favorites.insert(asset.id.clone(), asset.reduced());
        self.cache.save_favorites(&self.favorites);
        self.emit(StoreEvent::FavoriteAdded(asset.id.clone()));
    }

    /// Unpin an asset. Removing an id that is not pinned is a no-op apart
    /// from rewriting the durable set.
    pub fn remove_favorite(&mut self, id: &str) {
        self.favorites.remove(id);
        self.cache.save_favorites(&self.favorites);
        self.emit(StoreEvent::FavoriteRemoved(id.to_string()));
    }

    // =========================================================================
    // Currency selection
    // =========================================================================

    /// Switch the active quote currency and persist the choice. Does not
    /// refetch anything - callers decide when to refresh the candidate set
    /// they display.
    pub fn set_active_currency(&mut self, currency: &str) {
        self.active_currency = currency.to_string();
        self.cache.save_active_currency(&self.active_currency);
        self.emit(StoreEvent::CurrencyChanged(self.active_currency.clone()));
    }

    // =========================================================================
    // Read surface
    // =========================================================================

    pub fn currencies(&self) -> &[String] {
        &self.currencies
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn assets(&self) -> &HashMap<String, AssetRecord> {
        &self.assets
    }

    pub fn asset(&self, id: &str) -> Option<&AssetRecord> {
        self.assets.get(id)
    }

    pub fn favorites(&self) -> &HashMap<String, AssetRecord> {
        &self.favorites
    }

    pub fn active_currency(&self) -> &str {
        &self.active_currency
    }

    pub fn has_currencies(&self) -> bool {
        !self.currencies.is_empty()
    }

    pub fn has_categories(&self) -> bool {
        !self.categories.is_empty()
    }

    pub fn has_assets(&self) -> bool {
        !self.assets.is_empty()
    }

    pub fn cache_ages(&self) -> CacheAges {
        self.cache.ages()
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Subscribe to change notifications. Dropped receivers are pruned on
    /// the next emission.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StoreEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use anyhow::bail;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::cache::MemoryStore;
    use crate::models::{CategoryEntry, CoinListEntry, MarketEntry, Sparkline};

    #[derive(Default)]
    struct CallLog {
        currencies: usize,
        categories: usize,
        coins: usize,
        markets: Vec<(Vec<String>, String)>,
    }

    /// Scripted MarketApi with call counting.
    #[derive(Clone, Default)]
    struct MockApi {
        currencies: Vec<String>,
        categories: Vec<CategoryEntry>,
        coins: Vec<CoinListEntry>,
        /// Market entries per quote currency; requests are answered with
        /// the configured entries filtered to the requested ids.
        markets: HashMap<String, Vec<MarketEntry>>,
        fail_markets: bool,
        calls: Arc<Mutex<CallLog>>,
    }

    #[async_trait]
    impl MarketApi for MockApi {
        async fn supported_currencies(&self) -> Result<Vec<String>> {
            self.calls.lock().unwrap().currencies += 1;
            Ok(self.currencies.clone())
        }

        async fn category_list(&self) -> Result<Vec<CategoryEntry>> {
            self.calls.lock().unwrap().categories += 1;
            Ok(self.categories.clone())
        }

        async fn coin_list(&self) -> Result<Vec<CoinListEntry>> {
            self.calls.lock().unwrap().coins += 1;
            Ok(self.coins.clone())
        }

        async fn market_data(&self, ids: &[String], vs_currency: &str) -> Result<Vec<MarketEntry>> {
            self.calls
                .lock()
                .unwrap()
                .markets
                .push((ids.to_vec(), vs_currency.to_string()));
            if self.fail_markets {
                bail!("connection reset by peer");
            }
            Ok(self
                .markets
                .get(vs_currency)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .filter(|entry| ids.contains(&entry.id))
                .collect())
        }
    }

    fn coin(id: &str, name: &str, symbol: &str) -> CoinListEntry {
        CoinListEntry {
            id: id.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
        }
    }

    fn market_entry(id: &str, price: f64) -> MarketEntry {
        MarketEntry {
            id: id.to_string(),
            symbol: None,
            name: None,
            image: Some(format!("https://example.org/{}.png", id)),
            current_price: Some(price),
            market_cap: Some(1e12),
            total_volume: Some(1e10),
            price_change_24h: Some(100.0),
            last_updated: None,
            sparkline_in_7d: Some(Sparkline { price: vec![1.0, 2.0, 3.0] }),
        }
    }

    fn store_with(api: MockApi) -> (CatalogStore, MemoryStore) {
        let storage = MemoryStore::new();
        let cache = CacheManager::new(Box::new(storage.clone()));
        (CatalogStore::new(Box::new(api), cache, DEFAULT_CURRENCY), storage)
    }

    fn durable_view(storage: &MemoryStore) -> CacheManager {
        CacheManager::new(Box::new(storage.clone()))
    }

    #[tokio::test]
    async fn test_load_currencies_cold_start_fetches_once() {
        let api = MockApi {
            currencies: vec!["eur".to_string(), "usd".to_string()],
            ..Default::default()
        };
        let calls = api.calls.clone();
        let (mut store, storage) = store_with(api);

        store.load_currencies().await.unwrap();
        store.load_currencies().await.unwrap();

        assert_eq!(calls.lock().unwrap().currencies, 1);
        assert_eq!(store.currencies(), ["eur", "usd"]);
        assert!(store.has_currencies());

        let cached = durable_view(&storage).load_currencies().expect("durable copy written");
        assert_eq!(cached.data, vec!["eur", "usd"]);
    }

    #[tokio::test]
    async fn test_load_currencies_prefers_cache_over_network() {
        let api = MockApi::default();
        let calls = api.calls.clone();
        let (mut store, storage) = store_with(api);
        durable_view(&storage).save_currencies(&["chf".to_string()]);

        store.load_currencies().await.unwrap();

        assert_eq!(calls.lock().unwrap().currencies, 0);
        assert_eq!(store.currencies(), ["chf"]);
    }

    #[tokio::test]
    async fn test_load_currencies_empty_response_is_not_cached() {
        let api = MockApi::default();
        let (mut store, storage) = store_with(api);

        store.load_currencies().await.unwrap();

        assert!(!store.has_currencies());
        assert!(durable_view(&storage).load_currencies().is_none());
    }

    #[tokio::test]
    async fn test_load_categories_maps_remote_shape() {
        let api = MockApi {
            categories: vec![CategoryEntry {
                category_id: "layer-1".to_string(),
                name: "Layer 1 (L1)".to_string(),
            }],
            ..Default::default()
        };
        let (mut store, storage) = store_with(api);

        store.load_categories().await.unwrap();

        assert_eq!(store.categories().len(), 1);
        assert_eq!(store.categories()[0].id, "layer-1");
        assert_eq!(store.categories()[0].name, "Layer 1 (L1)");

        let cached = durable_view(&storage).load_categories().expect("durable copy written");
        assert_eq!(cached.data[0].id, "layer-1");
    }

    #[tokio::test]
    async fn test_load_assets_initializes_empty_price_maps() {
        let api = MockApi {
            coins: vec![coin("bitcoin", "Bitcoin", "btc"), coin("ethereum", "Ethereum", "eth")],
            ..Default::default()
        };
        let calls = api.calls.clone();
        let (mut store, storage) = store_with(api);

        store.load_assets().await.unwrap();
        store.load_assets().await.unwrap();

        assert_eq!(calls.lock().unwrap().coins, 1);
        assert_eq!(store.assets().len(), 2);
        let bitcoin = store.asset("bitcoin").unwrap();
        assert_eq!(bitcoin.symbol, "btc");
        assert!(bitcoin.prices_by_currency.is_empty());

        let cached = durable_view(&storage).load_assets().expect("durable copy written");
        assert_eq!(cached.data.len(), 2);
    }

    #[tokio::test]
    async fn test_load_assets_hydration_is_metadata_only() {
        let api = MockApi::default();
        let calls = api.calls.clone();
        let (mut store, storage) = store_with(api);

        // Seed the durable catalog with an enriched record, as a previous
        // session would have left it.
        let mut enriched = AssetRecord::from_listing(coin("bitcoin", "Bitcoin", "btc"));
        enriched.apply_market_entry(&market_entry("bitcoin", 50000.0), "usd");
        let mut seeded = HashMap::new();
        seeded.insert("bitcoin".to_string(), enriched);
        durable_view(&storage).save_assets(&seeded);

        store.load_assets().await.unwrap();

        assert_eq!(calls.lock().unwrap().coins, 0);
        let bitcoin = store.asset("bitcoin").unwrap();
        assert_eq!(bitcoin.name, "Bitcoin");
        // Static metadata survives hydration, price snapshots do not
        assert!(bitcoin.image.is_some());
        assert!(bitcoin.prices_by_currency.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_prices_merges_market_entry() {
        let entry: MarketEntry = serde_json::from_value(json!({
            "id": "bitcoin",
            "current_price": 50000.0,
            "market_cap": 1e12,
            "total_volume": 1e10,
            "price_change_24h": 100.0,
            "image": "x",
            "sparkline_in_7d": {"price": [1.0, 2.0, 3.0]}
        }))
        .unwrap();
        let api = MockApi {
            coins: vec![coin("bitcoin", "Bitcoin", "btc")],
            markets: HashMap::from([("usd".to_string(), vec![entry])]),
            ..Default::default()
        };
        let (mut store, _storage) = store_with(api);
        store.set_active_currency("usd");
        store.load_assets().await.unwrap();

        store.refresh_prices(&["bitcoin".to_string()]).await.unwrap();

        let bitcoin = store.asset("bitcoin").unwrap();
        assert_eq!(bitcoin.image.as_deref(), Some("x"));
        assert_eq!(bitcoin.sparkline_7d, Some(vec![1.0, 2.0, 3.0]));
        let snapshot = bitcoin.price_for("usd").unwrap();
        assert_eq!(snapshot.current_price, 50000.0);
        assert_eq!(snapshot.market_cap, 1e12);
        assert_eq!(snapshot.total_volume, 1e10);
        assert_eq!(snapshot.price_change_24h, 100.0);
    }

    #[tokio::test]
    async fn test_refresh_prices_noop_when_all_candidates_priced() {
        let api = MockApi {
            coins: vec![coin("bitcoin", "Bitcoin", "btc")],
            markets: HashMap::from([("eur".to_string(), vec![market_entry("bitcoin", 46000.0)])]),
            ..Default::default()
        };
        let calls = api.calls.clone();
        let (mut store, _storage) = store_with(api);
        store.load_assets().await.unwrap();

        store.refresh_prices(&["bitcoin".to_string()]).await.unwrap();
        store.refresh_prices(&["bitcoin".to_string()]).await.unwrap();

        assert_eq!(calls.lock().unwrap().markets.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_prices_is_additive_across_currencies() {
        let api = MockApi {
            coins: vec![coin("bitcoin", "Bitcoin", "btc")],
            markets: HashMap::from([
                ("usd".to_string(), vec![market_entry("bitcoin", 50000.0)]),
                ("eur".to_string(), vec![market_entry("bitcoin", 46000.0)]),
            ]),
            ..Default::default()
        };
        let (mut store, _storage) = store_with(api);
        store.load_assets().await.unwrap();

        store.set_active_currency("usd");
        store.refresh_prices(&["bitcoin".to_string()]).await.unwrap();
        let usd_before = store.asset("bitcoin").unwrap().price_for("usd").cloned();

        store.set_active_currency("eur");
        store.refresh_prices(&["bitcoin".to_string()]).await.unwrap();

        let bitcoin = store.asset("bitcoin").unwrap();
        assert_eq!(bitcoin.price_for("usd").cloned(), usd_before);
        assert_eq!(bitcoin.price_for("eur").unwrap().current_price, 46000.0);
        // Switching back needs no refetch
        assert!(bitcoin.has_price_for("usd"));
    }

    #[tokio::test]
    async fn test_refresh_prices_drops_unknown_candidates() {
        let api = MockApi {
            coins: vec![coin("bitcoin", "Bitcoin", "btc")],
            ..Default::default()
        };
        let calls = api.calls.clone();
        let (mut store, _storage) = store_with(api);
        store.load_assets().await.unwrap();

        store.refresh_prices(&["dogecoin".to_string()]).await.unwrap();

        assert!(calls.lock().unwrap().markets.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_prices_leaves_uncovered_ids_retryable() {
        // The response covers bitcoin only; ethereum stays unpriced and is
        // requested again by the next call.
        let api = MockApi {
            coins: vec![coin("bitcoin", "Bitcoin", "btc"), coin("ethereum", "Ethereum", "eth")],
            markets: HashMap::from([("eur".to_string(), vec![market_entry("bitcoin", 46000.0)])]),
            ..Default::default()
        };
        let calls = api.calls.clone();
        let (mut store, _storage) = store_with(api);
        store.load_assets().await.unwrap();

        let candidates = vec!["bitcoin".to_string(), "ethereum".to_string()];
        store.refresh_prices(&candidates).await.unwrap();

        assert!(store.asset("bitcoin").unwrap().has_price_for("eur"));
        assert!(!store.asset("ethereum").unwrap().has_price_for("eur"));

        store.refresh_prices(&candidates).await.unwrap();
        let log = calls.lock().unwrap();
        assert_eq!(log.markets.len(), 2);
        assert_eq!(log.markets[1].0, vec!["ethereum".to_string()]);
    }

    #[tokio::test]
    async fn test_refresh_prices_failure_commits_nothing() {
        let api = MockApi {
            coins: vec![coin("bitcoin", "Bitcoin", "btc")],
            fail_markets: true,
            ..Default::default()
        };
        let (mut store, _storage) = store_with(api);
        store.load_assets().await.unwrap();

        let result = store.refresh_prices(&["bitcoin".to_string()]).await;

        assert!(result.is_err());
        let bitcoin = store.asset("bitcoin").unwrap();
        assert!(bitcoin.prices_by_currency.is_empty());
        assert!(bitcoin.image.is_none());
    }

    #[tokio::test]
    async fn test_add_favorite_stores_reduced_projection() {
        let api = MockApi {
            coins: vec![coin("bitcoin", "Bitcoin", "btc")],
            markets: HashMap::from([("eur".to_string(), vec![market_entry("bitcoin", 46000.0)])]),
            ..Default::default()
        };
        let (mut store, storage) = store_with(api);
        store.load_assets().await.unwrap();
        store.refresh_prices(&["bitcoin".to_string()]).await.unwrap();

        let bitcoin = store.asset("bitcoin").cloned().unwrap();
        store.add_favorite(&bitcoin);

        let favorite = store.favorites().get("bitcoin").unwrap();
        assert_eq!(favorite.name, "Bitcoin");
        assert_eq!(favorite.symbol, "btc");
        assert!(favorite.prices_by_currency.is_empty());

        let cached = durable_view(&storage).load_favorites().expect("favorites persisted");
        assert_eq!(cached.data.len(), 1);
        assert_eq!(cached.data[0].0, "bitcoin");
        assert!(cached.data[0].1.prices_by_currency.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_prices_syncs_favorite_to_catalog_record() {
        let api = MockApi {
            coins: vec![coin("bitcoin", "Bitcoin", "btc")],
            markets: HashMap::from([("eur".to_string(), vec![market_entry("bitcoin", 46000.0)])]),
            ..Default::default()
        };
        let (mut store, storage) = store_with(api);
        store.load_assets().await.unwrap();

        let bitcoin = store.asset("bitcoin").cloned().unwrap();
        store.add_favorite(&bitcoin);
        store.refresh_prices(&["bitcoin".to_string()]).await.unwrap();

        let favorite = store.favorites().get("bitcoin").unwrap();
        let catalog = store.asset("bitcoin").unwrap();
        assert_eq!(favorite, catalog);
        assert!(favorite.has_price_for("eur"));

        // The durable favorites set is only rewritten by add/remove
        let cached = durable_view(&storage).load_favorites().unwrap();
        assert!(cached.data[0].1.prices_by_currency.is_empty());
    }

    #[tokio::test]
    async fn test_remove_favorite_updates_durable_set() {
        let api = MockApi {
            coins: vec![coin("bitcoin", "Bitcoin", "btc"), coin("ethereum", "Ethereum", "eth")],
            ..Default::default()
        };
        let (mut store, storage) = store_with(api);
        store.load_assets().await.unwrap();

        let bitcoin = store.asset("bitcoin").cloned().unwrap();
        let ethereum = store.asset("ethereum").cloned().unwrap();
        store.add_favorite(&bitcoin);
        store.add_favorite(&ethereum);
        store.remove_favorite("bitcoin");

        assert!(store.favorites().get("bitcoin").is_none());
        assert!(store.favorites().get("ethereum").is_some());

        let cached = durable_view(&storage).load_favorites().unwrap();
        let ids: Vec<&str> = cached.data.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["ethereum"]);
    }

    #[tokio::test]
    async fn test_set_active_currency_persists_scalar_only() {
        let api = MockApi::default();
        let (mut store, storage) = store_with(api);

        assert_eq!(store.active_currency(), DEFAULT_CURRENCY);
        store.set_active_currency("usd");

        assert_eq!(store.active_currency(), "usd");
        let view = durable_view(&storage);
        assert_eq!(view.load_active_currency().unwrap().data, "usd");
        assert!(view.load_assets().is_none());
    }

    #[tokio::test]
    async fn test_new_restores_persisted_state() {
        let storage = MemoryStore::new();
        let view = durable_view(&storage);
        let mut favorites = HashMap::new();
        favorites.insert(
            "bitcoin".to_string(),
            AssetRecord::from_listing(coin("bitcoin", "Bitcoin", "btc")),
        );
        view.save_favorites(&favorites);
        view.save_active_currency("usd");

        let cache = CacheManager::new(Box::new(storage.clone()));
        let store = CatalogStore::new(Box::new(MockApi::default()), cache, DEFAULT_CURRENCY);

        assert_eq!(store.active_currency(), "usd");
        assert_eq!(store.favorites().len(), 1);
        assert!(store.favorites().contains_key("bitcoin"));
    }

    #[tokio::test]
    async fn test_subscribers_receive_mutation_events() {
        let api = MockApi {
            currencies: vec!["eur".to_string()],
            ..Default::default()
        };
        let (mut store, _storage) = store_with(api);
        let mut events = store.subscribe();

        store.load_currencies().await.unwrap();
        store.set_active_currency("usd");

        assert!(matches!(events.try_recv(), Ok(StoreEvent::CurrenciesLoaded(1))));
        assert!(matches!(events.try_recv(), Ok(StoreEvent::CurrencyChanged(c)) if c == "usd"));
        assert!(events.try_recv().is_err());
    }
}
