// In crates/engine/src/clients.rs

use app_config::types::BrokerSettings;
use broker_client::BrokerClient;
use database::User;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;

/// Per-user broker clients, built lazily and shared across tasks.
///
/// Reads take the shared lock; a cache miss upgrades to the write lock and
/// re-checks before inserting, so concurrent alerts for the same user build
/// at most one client.
pub struct ClientCache {
    settings: BrokerSettings,
    inner: RwLock<HashMap<Uuid, Arc<BrokerClient>>>,
}

impl ClientCache {
    pub fn new(settings: BrokerSettings) -> Self {
        ClientCache {
            settings,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached client for this user, building one if needed.
    pub async fn for_user(&self, user: &User) -> Result<Arc<BrokerClient>> {
        if let Some(client) = self.inner.read().await.get(&user.id) {
            return Ok(client.clone());
        }

        let mut cache = self.inner.write().await;
        if let Some(client) = cache.get(&user.id) {
            return Ok(client.clone());
        }

        let client = Arc::new(BrokerClient::new(
            &self.settings,
            user.broker_access_token.clone(),
        )?);
        cache.insert(user.id, client.clone());
        tracing::debug!(user_id = %user.id, "Built broker client");
        Ok(client)
    }
}
