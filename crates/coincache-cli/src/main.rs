//! coincache - a cached command-line viewer for crypto market data.
//!
//! Every command works through the catalog store, so static data
//! (currencies, categories, the coin listing) is fetched at most once and
//! then served from the durable cache, and prices already fetched for the
//! active currency are never requested again.

mod output;

use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coincache_core::{
    ApiClient, CacheManager, CatalogStore, Config, FileStore, MarketApi, DEFAULT_CURRENCY,
};

use output::{contains_ignore_case, format_change, format_compact, format_price, truncate};

/// Maximum rows printed by an asset search.
/// The full listing has five figures of entries; a search that matches more
/// than this needs a narrower query anyway.
const MAX_SEARCH_RESULTS: usize = 25;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_usage() {
    eprintln!("Usage: coincache <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status                       cache ages, favorites, active currency");
    eprintln!("  currencies                   list supported quote currencies");
    eprintln!("  categories                   list asset categories");
    eprintln!("  assets <query>               search the catalog by id, name or symbol");
    eprintln!("  price <id>...                show market data in the active currency");
    eprintln!("  favorites [add|remove <id>]  list or edit pinned assets");
    eprintln!("  currency [code]              show or switch the active currency");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
    let storage = FileStore::new(cache_dir)?;
    let cache = CacheManager::new(Box::new(storage));

    let api: Box<dyn MarketApi> = match config.api_base_url.as_deref() {
        Some(url) => Box::new(ApiClient::with_base_url(url)?),
        None => Box::new(ApiClient::new()?),
    };

    let fallback = config.default_currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
    let mut store = CatalogStore::new(api, cache, fallback);

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("status") | None => cmd_status(&store),
        Some("currencies") => cmd_currencies(&mut store).await?,
        Some("categories") => cmd_categories(&mut store).await?,
        Some("assets") => cmd_assets(&mut store, args.get(2).map(String::as_str)).await?,
        Some("price") => cmd_price(&mut store, &args[2..]).await?,
        Some("favorites") => cmd_favorites(&mut store, &args[2..]).await?,
        Some("currency") => cmd_currency(&mut store, args.get(2).map(String::as_str)),
        Some(other) => {
            eprintln!("Unknown command: {}\n", other);
            print_usage();
            std::process::exit(2);
        }
    }

    Ok(())
}

fn cmd_status(store: &CatalogStore) {
    let ages = store.cache_ages();
    let never = || "never".to_string();

    println!("active currency:   {}", store.active_currency());
    println!("favorites:         {}", store.favorites().len());
    println!("cached currencies: {}", ages.currencies.unwrap_or_else(never));
    println!("cached categories: {}", ages.categories.unwrap_or_else(never));
    println!("cached assets:     {}", ages.assets.unwrap_or_else(never));
}

async fn cmd_currencies(store: &mut CatalogStore) -> Result<()> {
    store.load_currencies().await?;

    let active = store.active_currency().to_string();
    for currency in store.currencies() {
        let marker = if *currency == active { "*" } else { " " };
        println!("{} {}", marker, currency);
    }
    Ok(())
}

async fn cmd_categories(store: &mut CatalogStore) -> Result<()> {
    store.load_categories().await?;

    for category in store.categories() {
        println!("{:<32} {}", category.id, category.name);
    }
    Ok(())
}

async fn cmd_assets(store: &mut CatalogStore, query: Option<&str>) -> Result<()> {
    let Some(query) = query else {
        eprintln!("Usage: coincache assets <query>");
        std::process::exit(2);
    };

    store.load_assets().await?;

    let mut matches: Vec<_> = store
        .assets()
        .values()
        .filter(|asset| {
            contains_ignore_case(&asset.id, query)
                || contains_ignore_case(&asset.name, query)
                || contains_ignore_case(&asset.symbol, query)
        })
        .collect();
    matches.sort_by(|a, b| a.id.cmp(&b.id));

    if matches.is_empty() {
        println!("No assets match '{}'", query);
        return Ok(());
    }

    let total = matches.len();
    for asset in matches.iter().take(MAX_SEARCH_RESULTS) {
        println!("{:<24} {:<8} {}", truncate(&asset.id, 24), asset.symbol, truncate(&asset.name, 40));
    }
    if total > MAX_SEARCH_RESULTS {
        println!("... and {} more", total - MAX_SEARCH_RESULTS);
    }
    Ok(())
}

async fn cmd_price(store: &mut CatalogStore, ids: &[String]) -> Result<()> {
    if ids.is_empty() {
        eprintln!("Usage: coincache price <id>...");
        std::process::exit(2);
    }

    store.load_assets().await?;
    store.refresh_prices(ids).await?;

    let currency = store.active_currency().to_string();
    for id in ids {
        match store.asset(id) {
            Some(asset) => match asset.price_for(&currency) {
                Some(snapshot) => println!(
                    "{:<16} {:>14} {}   cap {:>8}   vol {:>8}   24h {:>10}",
                    asset.symbol,
                    format_price(snapshot.current_price),
                    currency,
                    format_compact(snapshot.market_cap),
                    format_compact(snapshot.total_volume),
                    format_change(snapshot.price_change_24h),
                ),
                None => println!("{:<16} no {} data returned", id, currency),
            },
            None => println!("{:<16} unknown asset", id),
        }
    }
    Ok(())
}

async fn cmd_favorites(store: &mut CatalogStore, args: &[String]) -> Result<()> {
    match (args.first().map(String::as_str), args.get(1)) {
        (Some("add"), Some(id)) => {
            store.load_assets().await?;
            let Some(asset) = store.asset(id).cloned() else {
                eprintln!("Unknown asset: {}", id);
                std::process::exit(2);
            };
            store.add_favorite(&asset);
            println!("Pinned {}", id);
        }
        (Some("remove"), Some(id)) => {
            store.remove_favorite(id);
            println!("Unpinned {}", id);
        }
        (None, _) => {
            if store.favorites().is_empty() {
                println!("No favorites pinned");
                return Ok(());
            }
            let mut favorites: Vec<_> = store.favorites().values().collect();
            favorites.sort_by(|a, b| a.id.cmp(&b.id));
            for asset in favorites {
                println!("{:<24} {:<8} {}", asset.id, asset.symbol, truncate(&asset.name, 40));
            }
        }
        _ => {
            eprintln!("Usage: coincache favorites [add|remove <id>]");
            std::process::exit(2);
        }
    }
    Ok(())
}

fn cmd_currency(store: &mut CatalogStore, code: Option<&str>) {
    match code {
        Some(code) => {
            store.set_active_currency(code);
            println!("Active currency set to {}", code);
        }
        None => println!("{}", store.active_currency()),
    }
}
