//! coincache-core - a persistently cached catalog of crypto market data.
//!
//! The crate is organized around one component, the [`CatalogStore`]: an
//! in-memory catalog of assets, currencies, categories and favorites that
//! mirrors itself into a durable key-value cache so that static data is
//! fetched from the network at most once, and per-currency price snapshots
//! accumulate without ever being refetched for a currency already seen.
//!
//! The store's two collaborators are injected: any [`MarketApi`]
//! implementation for remote data (production: [`ApiClient`] over the
//! CoinGecko v3 API) and any [`Storage`] backend for durable state
//! (production: [`FileStore`] under the platform cache directory).

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod store;

pub use api::{ApiClient, ApiError, MarketApi};
pub use cache::{CacheAges, CacheManager, CachedData, FileStore, MemoryStore, Storage};
pub use config::Config;
pub use models::{AssetRecord, Category, PriceSnapshot};
pub use store::{CatalogStore, StoreEvent, DEFAULT_CURRENCY};
