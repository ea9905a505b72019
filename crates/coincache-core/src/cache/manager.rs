use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{AssetRecord, Category};

use super::storage::Storage;

// Fixed storage keys. The directory/catalog keys are shared with earlier
// versions of the cache format and must not change.
const KEY_CURRENCIES: &str = "temp_currencies";
const KEY_CATEGORIES: &str = "temp_categories";
const KEY_ASSETS: &str = "temp_crypto";
const KEY_ACTIVE_CURRENCY: &str = "crypto_currency";
const KEY_FAVORITES: &str = "crypto_favorites";

/// Envelope persisted around every cached value, recording when the data
/// was fetched. The timestamp feeds age displays only; it never gates the
/// cache-over-network preference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        // Negative ages (clock skew) read as fresh
        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Typed layer over a `Storage` backend.
///
/// Owns the key names and the persisted encodings: directories are stored
/// as plain sequences, the catalog and favorites as ordered `[id, record]`
/// pair lists (sorted by id for stable files), the active currency as a
/// scalar. All writes go through the backend's fire-and-forget `set`.
pub struct CacheManager {
    storage: Box<dyn Storage>,
}

impl CacheManager {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<CachedData<T>> {
        let value = self.storage.get(key)?;
        match serde_json::from_value(value) {
            Ok(cached) => Some(cached),
            Err(e) => {
                debug!(key, error = %e, "Malformed cache entry, treating as miss");
                None
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, data: &T) {
        match serde_json::to_value(CachedData::new(data)) {
            Ok(value) => self.storage.set(key, value),
            Err(e) => warn!(key, error = %e, "Failed to serialize cache entry"),
        }
    }

    fn sorted_pairs<'a>(map: &'a HashMap<String, AssetRecord>) -> Vec<(&'a String, &'a AssetRecord)> {
        let mut pairs: Vec<_> = map.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }

    // ===== Currency directory =====

    pub fn load_currencies(&self) -> Option<CachedData<Vec<String>>> {
        self.load(KEY_CURRENCIES)
    }

    pub fn save_currencies(&self, currencies: &[String]) {
        self.save(KEY_CURRENCIES, &currencies);
    }

    // ===== Category directory =====

    pub fn load_categories(&self) -> Option<CachedData<Vec<Category>>> {
        self.load(KEY_CATEGORIES)
    }

    pub fn save_categories(&self, categories: &[Category]) {
        self.save(KEY_CATEGORIES, &categories);
    }

    // ===== Asset catalog =====

    pub fn load_assets(&self) -> Option<CachedData<Vec<(String, AssetRecord)>>> {
        self.load(KEY_ASSETS)
    }

    pub fn save_assets(&self, assets: &HashMap<String, AssetRecord>) {
        self.save(KEY_ASSETS, &Self::sorted_pairs(assets));
    }

    // ===== Favorites =====

    pub fn load_favorites(&self) -> Option<CachedData<Vec<(String, AssetRecord)>>> {
        self.load(KEY_FAVORITES)
    }

    pub fn save_favorites(&self, favorites: &HashMap<String, AssetRecord>) {
        self.save(KEY_FAVORITES, &Self::sorted_pairs(favorites));
    }

    // ===== Active currency =====

    pub fn load_active_currency(&self) -> Option<CachedData<String>> {
        self.load(KEY_ACTIVE_CURRENCY)
    }

    pub fn save_active_currency(&self, currency: &str) {
        self.save(KEY_ACTIVE_CURRENCY, &currency);
    }

    // ===== Cache age information =====

    fn age_of<T: DeserializeOwned>(&self, key: &str) -> Option<String> {
        self.load::<T>(key).map(|cached| cached.age_display())
    }

    pub fn ages(&self) -> CacheAges {
        CacheAges {
            currencies: self.age_of::<Vec<String>>(KEY_CURRENCIES),
            categories: self.age_of::<Vec<Category>>(KEY_CATEGORIES),
            assets: self.age_of::<Vec<(String, AssetRecord)>>(KEY_ASSETS),
            favorites: self.age_of::<Vec<(String, AssetRecord)>>(KEY_FAVORITES),
        }
    }
}

/// Per-sub-store cache ages for status displays. `None` means never cached.
#[derive(Debug, Default)]
pub struct CacheAges {
    pub currencies: Option<String>,
    pub categories: Option<String>,
    pub assets: Option<String>,
    pub favorites: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
