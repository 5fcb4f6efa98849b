use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Key prefixes and fixed keys of the persisted layout.
pub mod keys {
    pub const USERS: &str = "bodyassess_users/";
    pub const USER_EMAILS: &str = "bodyassess_user_emails/";
    pub const CURRENT_USER: &str = "bodyassess_current_user";
    pub const ASSESSMENTS: &str = "bodyassess_assessments/";
}

/// Key-value backend holding one JSON document per key.
///
/// `set` on an existing key replaces the value in place: `list_prefix`
/// keeps returning it at the position of its first insertion.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
    /// Writes only when `key` is absent. Returns whether the write happened.
    async fn insert_if_absent(&self, key: &str, value: &str) -> anyhow::Result<bool>;
    /// Values under `prefix`, in insertion order.
    async fn list_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>>;
    async fn delete_prefix(&self, prefix: &str) -> anyhow::Result<u64>;
    fn is_available(&self) -> bool;
}

/// Picks a backend from a `DATABASE_URL`-style string.
pub async fn connect(url: &str) -> anyhow::Result<Arc<dyn StorageClient>> {
    if url == "memory" {
        info!("using in-memory storage");
        return Ok(Arc::new(MemoryStorage::new()));
    }
    let storage = SqliteStorage::connect(url).await?;
    info!(url = %url, "using sqlite storage");
    Ok(Arc::new(storage))
}

pub async fn get_json<T: DeserializeOwned>(
    storage: &dyn StorageClient,
    key: &str,
) -> anyhow::Result<Option<T>> {
    match storage.get(key).await? {
        Some(raw) => {
            let value = serde_json::from_str(&raw).with_context(|| format!("decode {}", key))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize + ?Sized>(
    storage: &dyn StorageClient,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value).with_context(|| format!("encode {}", key))?;
    storage.set(key, &raw).await
}

pub async fn list_json<T: DeserializeOwned>(
    storage: &dyn StorageClient,
    prefix: &str,
) -> anyhow::Result<Vec<T>> {
    storage
        .list_prefix(prefix)
        .await?
        .iter()
        .map(|raw| serde_json::from_str(raw).with_context(|| format!("decode under {}", prefix)))
        .collect()
}

/// Drops users, the email index, assessments and the session pointer.
pub async fn clear_all_data(storage: &dyn StorageClient) -> anyhow::Result<()> {
    let mut removed = 0;
    for prefix in [keys::USERS, keys::USER_EMAILS, keys::ASSESSMENTS] {
        removed += storage.delete_prefix(prefix).await?;
    }
    storage.delete(keys::CURRENT_USER).await?;
    info!(removed, "all data cleared");
    Ok(())
}
