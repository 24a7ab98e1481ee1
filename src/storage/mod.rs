//! Opaque key/value storage with expiration semantics.
//!
//! Every persisted entry the engine keeps (pushed authorization requests,
//! JWT statuses, authorization grants) goes through the [`Storage`] trait
//! as namespaced keys (see [`keys::KeyFactory`]) and JSON values. Entries
//! carry absolute, relative-to-now or sliding expiration; the token
//! registry uses absolute-only, the PAR store relative-only.

pub mod keys;
pub mod memory;

pub use keys::KeyFactory;
pub use memory::InMemoryStorage;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Expiration options for a stored entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageOptions {
    /// The entry expires at this instant.
    pub absolute_expiration: Option<DateTime<Utc>>,

    /// The entry expires this long after it was written.
    pub absolute_expiration_relative_to_now: Option<Duration>,

    /// Each read pushes the expiry forward by this window.
    pub sliding_expiration: Option<Duration>,
}

impl StorageOptions {
    pub fn absolute(expires_at: DateTime<Utc>) -> Self {
        Self {
            absolute_expiration: Some(expires_at),
            ..Default::default()
        }
    }

    pub fn relative(expires_in: Duration) -> Self {
        Self {
            absolute_expiration_relative_to_now: Some(expires_in),
            ..Default::default()
        }
    }

    pub fn sliding(window: Duration) -> Self {
        Self {
            sliding_expiration: Some(window),
            ..Default::default()
        }
    }
}

/// Process-shared key/value store. Implementations must be safe for
/// concurrent readers and writers and must never hold locks across await
/// points.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write an entry. Writing an existing key overwrites it.
    async fn set(&self, key: &str, value: Vec<u8>, options: StorageOptions)
        -> Result<(), StorageError>;

    /// Read an entry without consuming it.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Atomically read and delete an entry. A second `remove` of the same
    /// key returns `None`, which is what makes single-use consumption safe
    /// under concurrency.
    async fn remove(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

/// Serialize `value` as JSON and store it under `key`.
pub async fn put_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
    options: StorageOptions,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value)?;
    storage.set(key, bytes, options).await
}

/// Read and deserialize the entry under `key`, if present.
pub async fn read_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Consume and deserialize the entry under `key`, if present.
pub async fn take_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.remove(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}
