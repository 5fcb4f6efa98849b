use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::StorageClient;

/// Single-file SQLite backend over the `kv_store` table.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("parse sqlite url {}", url))?
            .create_if_missing(true);

        // An in-memory database lives only as long as its one connection.
        let in_memory = url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("connect to sqlite")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run sqlite migrations")?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl StorageClient for SqliteStorage {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("kv get")?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .context("kv set")?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .context("kv delete")?;
        Ok(())
    }

    async fn insert_if_absent(&self, key: &str, value: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO kv_store (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .context("kv insert_if_absent")?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value
              FROM kv_store
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY seq ASC
            "#,
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .context("kv list_prefix")?;
        Ok(rows)
    }

    async fn delete_prefix(&self, prefix: &str) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM kv_store WHERE substr(key, 1, length(?1)) = ?1")
            .bind(prefix)
            .execute(&self.pool)
            .await
            .context("kv delete_prefix")?;
        Ok(result.rows_affected())
    }

    fn is_available(&self) -> bool {
        !self.pool.is_closed()
    }
}
