//! Durable caching layer.
//!
//! Two pieces: the `Storage` trait with its file and in-memory backends
//! (string keys, JSON values, synchronous), and the `CacheManager`, the
//! typed layer that owns the key names, wraps every value in a
//! `CachedData` envelope, and converts keyed mappings to and from their
//! persisted pair-list form.

pub mod manager;
pub mod storage;

pub use manager::{CacheAges, CacheManager, CachedData};
pub use storage::{FileStore, MemoryStore, Storage};
