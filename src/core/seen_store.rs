use crate::domain::ports::Storage;
use crate::utils::error::{MonitorError, Result};
use std::collections::HashSet;

/// 已通知過的 offer id 集合，透過 [`Storage`] 持久化成 JSON 陣列。
pub struct SeenStore<S: Storage> {
    storage: S,
    path: String,
    ids: HashSet<String>,
    dirty: bool,
}

impl<S: Storage> SeenStore<S> {
    /// 啟動時載入。檔案不存在或內容壞掉都當成「沒有先前狀態」。
    pub async fn load(storage: S, path: impl Into<String>) -> Self {
        let path = path.into();
        let ids = match storage.read_file(&path).await {
            Ok(bytes) => match decode(&bytes) {
                Ok(ids) => {
                    tracing::info!("📂 Loaded {} seen offers from {}", ids.len(), path);
                    ids
                }
                Err(e) => {
                    tracing::warn!("⚠️ Ignoring unreadable seen store {}: {}", path, e);
                    HashSet::new()
                }
            },
            Err(MonitorError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("📂 No seen store at {}, starting empty", path);
                HashSet::new()
            }
            Err(e) => {
                tracing::warn!("⚠️ Could not read seen store {}: {}", path, e);
                HashSet::new()
            }
        };

        Self {
            storage,
            path,
            ids,
            dirty: false,
        }
    }

    pub fn is_new(&self, id: &str) -> bool {
        !self.ids.contains(id)
    }

    /// Idempotent. Returns true when the id was not recorded before.
    pub fn record_seen(&mut self, id: &str) -> bool {
        let inserted = self.ids.insert(id.to_string());
        self.dirty |= inserted;
        inserted
    }

    /// 移除所有不在 `current` 裡的 id，回傳被移除的 id (已排序)。
    ///
    /// `current` 必須是一次成功、完整抓取的快照。
    pub fn prune(&mut self, current: &HashSet<String>) -> Vec<String> {
        let mut stale: Vec<String> = self
            .ids
            .iter()
            .filter(|id| !current.contains(*id))
            .cloned()
            .collect();
        stale.sort();

        for id in &stale {
            self.ids.remove(id);
        }
        if !stale.is_empty() {
            self.dirty = true;
        }
        stale
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// 把整個集合寫回儲存體。沒有變動時不寫。
    pub async fn persist(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let data = serde_json::to_vec(&self.ids())?;
        self.storage.write_file(&self.path, &data).await?;
        self.dirty = false;
        tracing::debug!("💾 Persisted {} seen offers to {}", self.ids.len(), self.path);
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> Result<HashSet<String>> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    match value {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect()),
        _ => Err(MonitorError::parse("seen store is not a JSON array")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn with_file(path: &str, data: &[u8]) -> Self {
            let storage = Self::default();
            storage
                .files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            storage
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                MonitorError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let store = SeenStore::load(MockStorage::default(), "seen.json").await;
        assert!(store.is_empty());
        assert!(store.is_new("1"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty_store() {
        let storage = MockStorage::with_file("seen.json", b"{not json").await;
        assert!(SeenStore::load(storage, "seen.json").await.is_empty());

        let storage = MockStorage::with_file("seen.json", br#"{"ids": ["1"]}"#).await;
        assert!(SeenStore::load(storage, "seen.json").await.is_empty());
    }

    #[tokio::test]
    async fn test_loads_existing_ids() {
        let storage = MockStorage::with_file("seen.json", br#"["A", "B", 42]"#).await;
        let store = SeenStore::load(storage, "seen.json").await;
        assert_eq!(store.ids(), vec!["42", "A", "B"]);
        assert!(!store.is_new("A"));
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn test_record_seen_is_idempotent() {
        let mut store = SeenStore::load(MockStorage::default(), "seen.json").await;
        assert!(store.record_seen("1"));
        assert!(!store.record_seen("1"));
        assert!(!store.is_new("1"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_prune_keeps_only_current_snapshot() {
        let storage = MockStorage::with_file("seen.json", br#"["A", "B", "C"]"#).await;
        let mut store = SeenStore::load(storage, "seen.json").await;

        let removed = store.prune(&set(&["B", "C", "D"]));
        assert_eq!(removed, vec!["A"]);
        assert_eq!(store.ids(), vec!["B", "C"]);
        assert!(store.is_dirty());
    }

    #[tokio::test]
    async fn test_prune_without_stale_ids_is_clean() {
        let storage = MockStorage::with_file("seen.json", br#"["1"]"#).await;
        let mut store = SeenStore::load(storage, "seen.json").await;
        assert!(store.prune(&set(&["1", "2"])).is_empty());
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn test_persist_writes_sorted_array() {
        let storage = MockStorage::default();
        let mut store = SeenStore::load(storage.clone(), "seen.json").await;
        store.record_seen("b");
        store.record_seen("a");
        store.persist().await.unwrap();

        let written = storage.get_file("seen.json").await.unwrap();
        assert_eq!(String::from_utf8(written).unwrap(), r#"["a","b"]"#);
        assert!(!store.is_dirty());

        let reloaded = SeenStore::load(storage, "seen.json").await;
        assert_eq!(reloaded.ids(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_persist_skips_clean_store() {
        let storage = MockStorage::default();
        let mut store = SeenStore::load(storage.clone(), "seen.json").await;
        store.persist().await.unwrap();
        assert!(storage.get_file("seen.json").await.is_none());
    }
}
