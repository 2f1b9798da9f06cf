//! # MPT Persistence Layer
//!
//! Byte-keyed, byte-valued stores that back the Merkle Patricia Trie.
//!
//! The trie only needs point lookups and overwrite-on-set, so the contract
//! ([`Store`]) is deliberately small. Implementations compose:
//!
//! - [`MemoryStore`]: in-process map, the default backend
//! - [`ReadOnlyStore`]: rejects every write
//! - [`NoDeleteStore`]: defers removals so historical roots stay resolvable
//! - [`CachedStore`]: write-back buffer with an LRU read cache
//! - `SledStore` (feature `sled`): on-disk backend
//!
//! ## Example
//!
//! ```rust
//! use mpt_persistence::{MemoryStore, NoDeleteStore, Store};
//! use std::sync::Arc;
//!
//! let memory = Arc::new(MemoryStore::new());
//! let store = NoDeleteStore::new(memory.clone());
//! store.set(b"k", b"v").unwrap();
//! store.remove(b"k").unwrap();
//! assert_eq!(memory.get(b"k").unwrap(), Some(b"v".to_vec()));
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod cached;
pub mod error;
pub mod memory;
pub mod no_delete;
pub mod read_only;
#[cfg(feature = "sled")]
pub mod sled_store;
pub mod store;

pub use cached::{CacheStats, CachedStore};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use no_delete::NoDeleteStore;
pub use read_only::ReadOnlyStore;
#[cfg(feature = "sled")]
pub use sled_store::SledStore;
pub use store::Store;

use mpt_config::{StoreConfig, TrieConfig};
use std::sync::Arc;

/// Opens the raw backend described by `config`.
pub fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn Store>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "sled")]
        StoreConfig::Sled { path } => Ok(Arc::new(SledStore::open(path)?)),
        #[cfg(not(feature = "sled"))]
        StoreConfig::Sled { .. } => Err(StoreError::Unsupported(
            "sled backend requires the `sled` feature".to_string(),
        )),
    }
}

/// Opens the configured backend and layers the history and write-cache
/// wrappers on top of it.
pub fn open_configured(config: &TrieConfig) -> StoreResult<Arc<dyn Store>> {
    let mut store = open_store(&config.store)?;
    if config.keep_history {
        store = Arc::new(NoDeleteStore::new(store));
    }
    if config.write_cache {
        store = Arc::new(CachedStore::with_capacity(store, config.cache_capacity)?);
    }
    log::debug!(
        "opened {} store (keep_history={}, write_cache={})",
        config.store,
        config.keep_history,
        config.write_cache
    );
    Ok(store)
}
