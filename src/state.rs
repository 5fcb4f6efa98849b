use crate::config::AppConfig;
use crate::session::SessionProvider;
use crate::storage::{self, StorageClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub session: SessionProvider,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let storage = storage::connect(&config.database_url).await?;
        Ok(Self::from_parts(config, storage))
    }

    pub fn from_parts(config: Arc<AppConfig>, storage: Arc<dyn StorageClient>) -> Self {
        let session = SessionProvider::new(storage.clone());
        Self {
            config,
            storage,
            session,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: "memory".into(),
            host: "127.0.0.1".into(),
            port: 0,
            enable_dev_routes: true,
        });
        let storage = Arc::new(crate::storage::MemoryStorage::new()) as Arc<dyn StorageClient>;
        Self::from_parts(config, storage)
    }
}
