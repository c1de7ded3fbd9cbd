use crate::core::cache::Cache;
use anyhow::Result;
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Wall-clock expiry so entries stay valid across process restarts.
#[derive(Serialize, Deserialize)]
struct StoredEntry<V> {
    value: V,
    expires_at: Option<SystemTime>,
}

impl<V> StoredEntry<V> {
    fn is_live(&self, now: SystemTime) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

/// Opens the keyspace every `DiskCache` partition lives in, creating `path`.
pub fn open_keyspace(path: &Path) -> Result<Keyspace> {
    std::fs::create_dir_all(path)?;
    Ok(fjall::Config::new(path).open()?)
}

/// Cache persisted in one fjall partition. Keys and entries are stored as JSON.
pub struct DiskCache<K, V> {
    keyspace: Keyspace,
    partition: PartitionHandle,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> DiskCache<K, V> {
    pub fn open(keyspace: &Keyspace, name: &str) -> Result<Self> {
        let partition = keyspace.open_partition(name, PartitionCreateOptions::default())?;
        Ok(DiskCache {
            keyspace: keyspace.clone(),
            partition,
            _marker: PhantomData,
        })
    }
}

impl<K, V> DiskCache<K, V>
where
    K: Serialize + Debug,
    V: Serialize + DeserializeOwned,
{
    fn read(&self, key: &K) -> Result<Option<V>> {
        let raw_key = serde_json::to_vec(key)?;
        let Some(bytes) = self.partition.get(&raw_key)? else {
            debug!(?key, "Cache MISS");
            return Ok(None);
        };
        let entry: StoredEntry<V> = serde_json::from_slice(&bytes)?;
        if !entry.is_live(SystemTime::now()) {
            debug!(?key, "Cache entry expired");
            self.partition.remove(raw_key)?;
            return Ok(None);
        }
        debug!(?key, "Cache HIT");
        Ok(Some(entry.value))
    }

    fn write(&self, key: &K, value: V, ttl: Option<Duration>) -> Result<()> {
        let entry = StoredEntry {
            value,
            expires_at: ttl.map(|ttl| SystemTime::now() + ttl),
        };
        self.partition
            .insert(serde_json::to_vec(key)?, serde_json::to_vec(&entry)?)?;
        self.keyspace.persist(PersistMode::Buffer)?;
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        let keys = self.partition.keys().collect::<Result<Vec<_>, _>>()?;
        for key in keys {
            self.partition.remove(key)?;
        }
        Ok(())
    }
}

// Storage failures degrade to misses; the caller refetches.
#[async_trait]
impl<K, V> Cache<K, V> for DiskCache<K, V>
where
    K: Serialize + Debug + Send + Sync,
    V: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, key: &K) -> Option<V> {
        self.read(key)
            .inspect_err(|e| debug!(?key, "Disk cache read failed: {}", e))
            .ok()
            .flatten()
    }

    async fn put(&self, key: K, value: V, ttl: Option<Duration>) {
        debug!(?key, ?ttl, "Cache PUT");
        if let Err(e) = self.write(&key, value, ttl) {
            debug!(?key, "Disk cache write failed: {}", e);
        }
    }

    async fn remove(&self, key: &K) {
        let removed = serde_json::to_vec(key)
            .map_err(anyhow::Error::from)
            .and_then(|raw_key| Ok(self.partition.remove(raw_key)?));
        if let Err(e) = removed {
            debug!(?key, "Disk cache remove failed: {}", e);
        }
    }

    async fn clear(&self) {
        if let Err(e) = self.clear_all() {
            debug!("Disk cache clear failed: {}", e);
        }
    }
}
