use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::StorageClient;

#[derive(Default)]
struct Entries {
    next_seq: u64,
    seq_by_key: HashMap<String, u64>,
    by_seq: BTreeMap<u64, (String, String)>,
}

impl Entries {
    fn remove(&mut self, key: &str) -> bool {
        match self.seq_by_key.remove(key) {
            Some(seq) => {
                self.by_seq.remove(&seq);
                true
            }
            None => false,
        }
    }
}

/// Process-local backend. Contents are lost on drop.
pub struct MemoryStorage {
    entries: RwLock<Entries>,
    available: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates a context with no backend present.
    #[cfg(test)]
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn read(&self) -> anyhow::Result<RwLockReadGuard<'_, Entries>> {
        self.entries
            .read()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))
    }

    fn write(&self) -> anyhow::Result<RwLockWriteGuard<'_, Entries>> {
        self.entries
            .write()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let entries = self.read()?;
        Ok(entries
            .seq_by_key
            .get(key)
            .and_then(|seq| entries.by_seq.get(seq))
            .map(|(_, value)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self.write()?;
        if let Some(seq) = entries.seq_by_key.get(key).copied() {
            entries.by_seq.insert(seq, (key.to_string(), value.to_string()));
            return Ok(());
        }
        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.seq_by_key.insert(key.to_string(), seq);
        entries.by_seq.insert(seq, (key.to_string(), value.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.write()?.remove(key);
        Ok(())
    }

    async fn insert_if_absent(&self, key: &str, value: &str) -> anyhow::Result<bool> {
        let mut entries = self.write()?;
        if entries.seq_by_key.contains_key(key) {
            return Ok(false);
        }
        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.seq_by_key.insert(key.to_string(), seq);
        entries.by_seq.insert(seq, (key.to_string(), value.to_string()));
        Ok(true)
    }

    async fn list_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let entries = self.read()?;
        Ok(entries
            .by_seq
            .values()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| value.clone())
            .collect())
    }

    async fn delete_prefix(&self, prefix: &str) -> anyhow::Result<u64> {
        let mut entries = self.write()?;
        let doomed: Vec<String> = entries
            .seq_by_key
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        for key in &doomed {
            entries.remove(key);
        }
        Ok(doomed.len() as u64)
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_contract() {
        let storage = MemoryStorage::new();
        crate::storage::tests::exercise_backend(&storage).await;
    }

    #[tokio::test]
    async fn reinserted_key_goes_to_the_end() {
        let storage = MemoryStorage::new();
        storage.set("k/1", "a").await.unwrap();
        storage.set("k/2", "b").await.unwrap();
        storage.delete("k/1").await.unwrap();
        storage.set("k/1", "c").await.unwrap();
        assert_eq!(storage.list_prefix("k/").await.unwrap(), vec!["b", "c"]);
    }

    #[test]
    fn availability_can_be_toggled() {
        let storage = MemoryStorage::new();
        assert!(storage.is_available());
        storage.set_available(false);
        assert!(!storage.is_available());
    }
}
