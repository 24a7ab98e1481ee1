use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::ClientInfo;

/// Lookup of registered clients. Client registration storage itself is the
/// host application's concern; the engine only reads.
#[async_trait]
pub trait ClientInfoProvider: Send + Sync {
    /// Find a client by its identifier. Lookup is case-sensitive.
    async fn try_find(&self, client_id: &str) -> Result<Option<ClientInfo>, StorageError>;
}

/// In-memory client registry.
#[derive(Debug, Default)]
pub struct InMemoryClientRegistry {
    clients: RwLock<HashMap<String, ClientInfo>>,
}

impl InMemoryClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, client: ClientInfo) {
        self.clients
            .write()
            .unwrap()
            .insert(client.client_id.clone(), client);
    }
}

#[async_trait]
impl ClientInfoProvider for InMemoryClientRegistry {
    async fn try_find(&self, client_id: &str) -> Result<Option<ClientInfo>, StorageError> {
        Ok(self.clients.read().unwrap().get(client_id).cloned())
    }
}
