//! Pushed authorization request storage (RFC 9126).

use std::sync::Arc;

use chrono::Duration;

use crate::error::StorageError;
use crate::models::{AuthorizationRequest, PushedAuthorizationResponse};
use crate::storage::{put_json, read_json, take_json, KeyFactory, Storage, StorageOptions};
use crate::utils::opaque;

/// Prefix of the opaque request URIs handed back to clients.
pub const REQUEST_URI_PREFIX: &str = "urn:ietf:params:oauth:request_uri:";

/// Whether a `request_uri` value refers to a pushed request rather than a
/// remote document.
pub fn is_pushed_request_uri(request_uri: &str) -> bool {
    request_uri.starts_with(REQUEST_URI_PREFIX)
}

/// Stores pushed authorization requests until the client comes back with
/// the issued `request_uri`. Entries live for a configured TTL and are
/// removed on first consumption.
pub struct ParStore {
    storage: Arc<dyn Storage>,
}

impl ParStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Store a request and mint the opaque URI under which it can be
    /// retrieved. Storing twice under the same URI overwrites, but minted
    /// URIs are unique so that only matters for crafted keys.
    pub async fn store(
        &self,
        model: AuthorizationRequest,
        expires_in: Duration,
    ) -> Result<PushedAuthorizationResponse, StorageError> {
        let request_uri = format!("{}{}", REQUEST_URI_PREFIX, opaque::generate_token());

        put_json(
            &*self.storage,
            &KeyFactory::pushed_request(&request_uri),
            &model,
            StorageOptions::relative(expires_in),
        )
        .await?;

        Ok(PushedAuthorizationResponse {
            request_uri,
            expires_in_secs: expires_in.num_seconds(),
            model,
        })
    }

    /// Retrieve a stored request. With `should_remove` the read consumes
    /// the entry: at most one caller gets the request, every later call
    /// sees `None`.
    pub async fn try_get(
        &self,
        request_uri: &str,
        should_remove: bool,
    ) -> Result<Option<AuthorizationRequest>, StorageError> {
        let key = KeyFactory::pushed_request(request_uri);
        if should_remove {
            take_json(&*self.storage, &key).await
        } else {
            read_json(&*self.storage, &key).await
        }
    }
}
