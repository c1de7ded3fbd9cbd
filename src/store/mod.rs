//! Cache backends for [`crate::core::cache::Cache`].

pub mod disk;
pub mod memory;

use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use disk::{DiskCache, open_keyspace};
use fjall::Keyspace;
use memory::MemoryCache;
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Hands out named caches. Persistent stores keep each cache in its own
/// partition of one on-disk keyspace; otherwise caches live in memory.
pub struct CacheStore {
    keyspace: Option<Keyspace>,
}

impl CacheStore {
    pub fn in_memory() -> Self {
        CacheStore { keyspace: None }
    }

    pub fn at_path(path: &Path) -> anyhow::Result<Self> {
        let keyspace = open_keyspace(path)?;
        debug!("Opened disk cache at {}", path.display());
        Ok(CacheStore {
            keyspace: Some(keyspace),
        })
    }

    /// The configured store. An unusable cache directory degrades to memory.
    pub fn from_config(config: &AppConfig) -> Self {
        if !config.persist_cache {
            return Self::in_memory();
        }
        match config
            .default_cache_path()
            .and_then(|path| Self::at_path(&path))
        {
            Ok(store) => store,
            Err(e) => {
                warn!("Disk cache unavailable, caching in memory: {}", e);
                Self::in_memory()
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.keyspace.is_some()
    }

    pub fn collection<V>(&self, name: &str) -> Arc<dyn Cache<String, V>>
    where
        V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        if let Some(keyspace) = &self.keyspace {
            match DiskCache::open(keyspace, name) {
                Ok(cache) => return Arc::new(cache),
                Err(e) => warn!("Failed to open cache partition {}: {}", name, e),
            }
        }
        Arc::new(MemoryCache::new())
    }
}
