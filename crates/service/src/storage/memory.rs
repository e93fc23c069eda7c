use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use models::{Record, RecordKey};
use tokio::{fs, sync::RwLock};

use super::{ScanFilter, StoreError, Table, Update};

/// In-process table keyed by [`RecordKey`].
///
/// Optionally snapshots its contents to a JSON file after every write so a
/// local dev server survives restarts without DynamoDB.
#[derive(Clone)]
pub struct MemoryTable<T> {
    name: String,
    inner: Arc<RwLock<BTreeMap<RecordKey, T>>>,
    file_path: Option<PathBuf>,
}

impl<T: Record> MemoryTable<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), inner: Arc::new(RwLock::new(BTreeMap::new())), file_path: None }
    }

    /// Load from `path` if it exists, creating an empty snapshot otherwise.
    /// Any other read failure is an error so a good snapshot is never
    /// overwritten with an empty table.
    pub async fn persistent(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file_path = path.into();
        let io_err = |op: &str, e: std::io::Error| StoreError::Backend(format!("{op} {}: {e}", file_path.display()));
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| io_err("create_dir", e))?;
        }
        let records: Vec<T> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Codec(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(io_err("read", e)),
        };
        let map = records.into_iter().map(|r| (r.key(), r)).collect();
        let table = Self { name: name.into(), inner: Arc::new(RwLock::new(map)), file_path: Some(file_path) };
        table.save().await?;
        Ok(table)
    }

    async fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.file_path else { return Ok(()) };
        let map = self.inner.read().await;
        let records: Vec<&T> = map.values().collect();
        let data = serde_json::to_vec(&records).map_err(|e| StoreError::Codec(e.to_string()))?;
        drop(map);
        fs::write(path, data).await.map_err(|e| StoreError::Backend(e.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

fn to_value<T: Record>(record: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::Codec(e.to_string()))
}

#[async_trait]
impl<T: Record> Table<T> for MemoryTable<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<T>, StoreError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn insert(&self, record: &T) -> Result<(), StoreError> {
        let key = record.key();
        let mut map = self.inner.write().await;
        if map.contains_key(&key) {
            return Err(StoreError::Conflict(key.to_string()));
        }
        map.insert(key, record.clone());
        drop(map);
        self.save().await
    }

    async fn put(&self, record: &T) -> Result<(), StoreError> {
        self.inner.write().await.insert(record.key(), record.clone());
        self.save().await
    }

    async fn put_batch(&self, records: &[T]) -> Result<usize, StoreError> {
        let mut map = self.inner.write().await;
        for record in records {
            map.insert(record.key(), record.clone());
        }
        drop(map);
        self.save().await?;
        Ok(records.len())
    }

    async fn scan(&self, filter: &ScanFilter) -> Result<Vec<T>, StoreError> {
        let map = self.inner.read().await;
        let mut out = Vec::new();
        for record in map.values() {
            if filter.is_empty() || filter.matches(&to_value(record)?) {
                out.push(record.clone());
            }
        }
        Ok(out)
    }

    async fn update(&self, key: &RecordKey, update: &Update) -> Result<Option<T>, StoreError> {
        let mut map = self.inner.write().await;
        let Some(current) = map.get(key) else { return Ok(None) };
        let mut value = to_value(current)?;
        update.apply(&mut value)?;
        let updated: T = serde_json::from_value(value).map_err(|e| StoreError::Codec(e.to_string()))?;
        map.insert(key.clone(), updated.clone());
        drop(map);
        self.save().await?;
        Ok(Some(updated))
    }
}
