//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::StorageError;
use crate::providers::{Clock, SystemClock};

use super::{Storage, StorageOptions};

struct Entry {
    value: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
    sliding: Option<Duration>,
}

impl Entry {
    fn expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// Process-local storage backed by a hash map. Expired entries are dropped
/// lazily on access. The critical section never spans an await point.
pub struct InMemoryStorage {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Build against an explicit clock so expiration can be tested without
    /// sleeping.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        options: StorageOptions,
    ) -> Result<(), StorageError> {
        let now = self.clock.now();
        let expires_at = options
            .absolute_expiration
            .or_else(|| options.absolute_expiration_relative_to_now.map(|d| now + d))
            .or_else(|| options.sliding_expiration.map(|d| now + d));

        let entry = Entry {
            value,
            expires_at,
            sliding: options.sliding_expiration,
        };
        self.entries.lock().unwrap().insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();

        match entries.get(key).map(|entry| entry.expired(now)) {
            None => Ok(None),
            Some(true) => {
                entries.remove(key);
                Ok(None)
            }
            Some(false) => {
                let entry = entries.get_mut(key).expect("entry was just observed");
                if let Some(window) = entry.sliding {
                    entry.expires_at = Some(now + window);
                }
                Ok(Some(entry.value.clone()))
            }
        }
    }

    async fn remove(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();

        match entries.remove(key) {
            Some(entry) if entry.expired(now) => Ok(None),
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }
}
