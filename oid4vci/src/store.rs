//! # In-Memory State Store
//!
//! A concurrent, in-process [`StateStore`] backed by a sharded map. Each key
//! is guarded by its shard lock for the duration of a single operation, so
//! expiry checks, reads, and removals of the same key never interleave.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::provider::StateStore;
use crate::state::State;

#[derive(Debug)]
struct Stored {
    expires_at: DateTime<Utc>,
    data: Vec<u8>,
}

impl Stored {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<State<T>> {
        Ok(serde_json::from_slice(&self.data)?)
    }
}

/// In-memory state store. Clones share the same underlying map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Stored>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for MemoryStore {
    async fn put<T: Serialize + Sync>(&self, key: &str, state: &State<T>) -> Result<()> {
        let stored = Stored { expires_at: state.expires_at, data: serde_json::to_vec(state)? };

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if !entry.get().is_expired(Utc::now()) {
                    return Err(anyhow!("state key already in use"));
                }
                entry.insert(stored);
            }
            Entry::Vacant(entry) => {
                entry.insert(stored);
            }
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<State<T>>> {
        let Entry::Occupied(entry) = self.entries.entry(key.to_string()) else {
            return Ok(None);
        };
        if entry.get().is_expired(Utc::now()) {
            entry.remove();
            tracing::debug!("reclaimed expired state");
            return Ok(None);
        }
        entry.get().decode().map(Some)
    }

    async fn take<T: DeserializeOwned>(&self, key: &str) -> Result<Option<State<T>>> {
        let Entry::Occupied(entry) = self.entries.entry(key.to_string()) else {
            return Ok(None);
        };
        let (_, stored) = entry.remove_entry();
        if stored.is_expired(Utc::now()) {
            return Ok(None);
        }
        stored.decode().map(Some)
    }

    async fn purge(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn sweep(&self) -> Result<usize> {
        let now = Utc::now();
        let mut removed = 0;
        self.entries.retain(|_, stored| {
            let keep = !stored.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
