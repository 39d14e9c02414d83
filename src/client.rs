//! One handle holding the configured storage, API client and session.

use std::sync::Arc;

use tracing::info;

use crate::api::ApiClient;
use crate::auth::SessionManager;
use crate::config::ClientConfig;
use crate::connectivity::NetworkStatus;
use crate::error::Result;
use crate::store::{FileStore, SecureStore, Storage};

pub struct Client {
    pub config: ClientConfig,
    pub storage: Storage,
    pub api: Arc<ApiClient>,
    pub session: Arc<SessionManager>,
    /// Feed platform connectivity changes in here.
    pub network: Arc<NetworkStatus>,
}

impl Client {
    /// Configure from `DIETPLAN_*` variables with the file-backed store.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ClientConfig::from_lookup(lookup)?;
        let store = Arc::new(FileStore::new(config.store_path()));
        Self::with_store(config, store)
    }

    pub fn with_store(config: ClientConfig, store: Arc<dyn SecureStore>) -> Result<Self> {
        let storage = Storage::new(store);
        let api = Arc::new(ApiClient::new(&config, storage.clone())?);
        let network = Arc::new(NetworkStatus::default());
        let session = Arc::new(SessionManager::new(
            api.clone(),
            storage.clone(),
            network.clone(),
        ));
        info!(api_url = %config.api_url, "Client configured");

        Ok(Self {
            config,
            storage,
            api,
            session,
            network,
        })
    }
}
