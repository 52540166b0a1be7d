//! Hash-sharded concurrent map
//!
//! Keys are spread over independently locked shards, so writers touching
//! different shards never contend.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use sha2::{Digest, Sha256};

use crate::errors::ConfigError;

/// Digest byte used to pick a shard
const SHARD_BYTE: usize = 17;

/// String-keyed map split across `RwLock`-guarded shards
#[derive(Debug)]
pub struct ShardedMap<V> {
    shards: Vec<RwLock<HashMap<String, V>>>,
}

impl<V> ShardedMap<V> {
    pub fn new(shard_count: usize) -> Result<Self, ConfigError> {
        if shard_count == 0 {
            return Err(ConfigError::NoShards);
        }
        let shards = (0..shard_count)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Ok(Self { shards })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard owning `key`
    pub fn shard_index(&self, key: &str) -> usize {
        let digest = Sha256::digest(key.as_bytes());
        usize::from(digest[SHARD_BYTE]) % self.shards.len()
    }

    pub fn insert(&self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        let index = self.shard_index(&key);
        self.write_shard(index).insert(key, value)
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.write_shard(self.shard_index(key)).remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read_shard(self.shard_index(key)).contains_key(key)
    }

    /// All keys, in no particular order
    ///
    /// Shards are visited one at a time, so the result is not an atomic view
    /// of the whole map under concurrent writes.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for index in 0..self.shards.len() {
            keys.extend(self.read_shard(index).keys().cloned());
        }
        keys
    }

    pub fn len(&self) -> usize {
        (0..self.shards.len())
            .map(|index| self.read_shard(index).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_shard(&self, index: usize) -> RwLockReadGuard<'_, HashMap<String, V>> {
        self.shards[index]
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_shard(&self, index: usize) -> RwLockWriteGuard<'_, HashMap<String, V>> {
        self.shards[index]
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone> ShardedMap<V> {
    pub fn get(&self, key: &str) -> Option<V> {
        self.read_shard(self.shard_index(key)).get(key).cloned()
    }
}
