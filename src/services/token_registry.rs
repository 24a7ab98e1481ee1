//! Revocation and replay tracking for issued JWTs, keyed by `jti`.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::models::JsonWebTokenStatus;
use crate::storage::{put_json, read_json, KeyFactory, Storage, StorageOptions};

/// Maps a `jti` to its recorded status. Entries live exactly as long as the
/// token they describe: the registry stores them with an absolute expiration
/// equal to the token's own `exp`, and reads never consume them.
pub struct TokenRegistry {
    storage: Arc<dyn Storage>,
}

impl TokenRegistry {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The recorded status of a token. `Unknown` for a `jti` never seen.
    pub async fn get_status(&self, jwt_id: &str) -> Result<JsonWebTokenStatus, StorageError> {
        let status: Option<JsonWebTokenStatus> =
            read_json(&*self.storage, &KeyFactory::jwt_status(jwt_id)).await?;
        Ok(status.unwrap_or_default())
    }

    /// Record a status. Overwrites whatever was recorded before.
    pub async fn set_status(
        &self,
        jwt_id: &str,
        status: JsonWebTokenStatus,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        put_json(
            &*self.storage,
            &KeyFactory::jwt_status(jwt_id),
            &status,
            StorageOptions::absolute(expires_at),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ManualClock;
    use crate::storage::InMemoryStorage;
    use chrono::Duration;

    fn registry_at(now: DateTime<Utc>) -> (Arc<ManualClock>, TokenRegistry) {
        let clock = Arc::new(ManualClock::new(now));
        let registry = TokenRegistry::new(Arc::new(InMemoryStorage::with_clock(clock.clone())));
        (clock, registry)
    }

    #[tokio::test]
    async fn test_unseen_jti_is_unknown() {
        let (_, registry) = registry_at(Utc::now());
        assert_eq!(
            registry.get_status("never-seen").await.unwrap(),
            JsonWebTokenStatus::Unknown
        );
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let now = Utc::now();
        let (_, registry) = registry_at(now);

        registry
            .set_status("jti-1", JsonWebTokenStatus::Used, now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(
            registry.get_status("jti-1").await.unwrap(),
            JsonWebTokenStatus::Used
        );

        // Reads are non-destructive.
        assert_eq!(
            registry.get_status("jti-1").await.unwrap(),
            JsonWebTokenStatus::Used
        );
    }

    #[tokio::test]
    async fn test_set_status_overwrites() {
        let now = Utc::now();
        let (_, registry) = registry_at(now);
        let expires_at = now + Duration::hours(1);

        registry
            .set_status("jti-1", JsonWebTokenStatus::Used, expires_at)
            .await
            .unwrap();
        registry
            .set_status("jti-1", JsonWebTokenStatus::Revoked, expires_at)
            .await
            .unwrap();

        assert_eq!(
            registry.get_status("jti-1").await.unwrap(),
            JsonWebTokenStatus::Revoked
        );
    }

    #[tokio::test]
    async fn test_entry_expires_with_the_token() {
        let now = Utc::now();
        let (clock, registry) = registry_at(now);

        registry
            .set_status("jti-1", JsonWebTokenStatus::Revoked, now + Duration::hours(6))
            .await
            .unwrap();

        clock.advance(Duration::hours(5));
        assert_eq!(
            registry.get_status("jti-1").await.unwrap(),
            JsonWebTokenStatus::Revoked
        );

        clock.advance(Duration::hours(2));
        assert_eq!(
            registry.get_status("jti-1").await.unwrap(),
            JsonWebTokenStatus::Unknown
        );
    }
}
