//! Table storage used by every service.
//!
//! `Table<T>` is the only persistence seam: services never talk to DynamoDB
//! directly. [`DynamoTable`] is the production backend; [`MemoryTable`] backs
//! tests and the in-memory dev mode.

use async_trait::async_trait;
use models::{Record, RecordKey};
use serde_json::Value;
use thiserror::Error;

pub mod dynamo;
pub mod memory;

pub use dynamo::DynamoTable;
pub use memory::MemoryTable;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item already exists: {0}")]
    Conflict(String),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("item encoding error: {0}")]
    Codec(String),
    /// An [`Update`] guard did not hold; nothing was written.
    #[error("update guard failed: {0}")]
    GuardFailed(String),
}

/// One attribute condition of a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, String),
    /// Case-sensitive substring match on a string attribute.
    Contains(String, String),
}

impl Condition {
    pub fn attribute(&self) -> &str {
        match self {
            Condition::Eq(a, _) | Condition::Contains(a, _) => a,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Condition::Eq(_, v) | Condition::Contains(_, v) => v,
        }
    }

    fn matches(&self, item: &Value) -> bool {
        let Some(actual) = item.get(self.attribute()).and_then(Value::as_str) else { return false };
        match self {
            Condition::Eq(_, expected) => actual == expected,
            Condition::Contains(_, needle) => actual.contains(needle.as_str()),
        }
    }
}

/// Conditions ANDed together; empty means "everything".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanFilter {
    pub conditions: Vec<Condition>,
}

impl ScanFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, attribute: &str, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Eq(attribute.to_string(), value.into()));
        self
    }

    pub fn contains(mut self, attribute: &str, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Contains(attribute.to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, item: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(item))
    }
}

/// Partial update: numeric increments plus attribute overwrites, optionally
/// guarded by numeric lower bounds checked atomically with the write.
#[derive(Debug, Clone, Default)]
pub struct Update {
    pub increments: Vec<(String, i64)>,
    pub sets: Vec<(String, Value)>,
    pub at_least: Vec<(String, i64)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(mut self, attribute: &str, by: i64) -> Self {
        self.increments.push((attribute.to_string(), by));
        self
    }

    pub fn set(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.sets.push((attribute.to_string(), value.into()));
        self
    }

    /// Only write when `attribute >= min` on the stored record.
    pub fn at_least(mut self, attribute: &str, min: i64) -> Self {
        self.at_least.push((attribute.to_string(), min));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.increments.is_empty() && self.sets.is_empty()
    }

    /// Apply to a JSON object in place. Used by the in-memory backend.
    pub fn apply(&self, item: &mut Value) -> Result<(), StoreError> {
        let obj = item
            .as_object_mut()
            .ok_or_else(|| StoreError::Codec("record is not an object".into()))?;
        for (attr, min) in &self.at_least {
            let current = obj.get(attr).and_then(Value::as_i64).unwrap_or(0);
            if current < *min {
                return Err(StoreError::GuardFailed(format!("{attr} is {current}, needs at least {min}")));
            }
        }
        for (attr, by) in &self.increments {
            let current = obj.get(attr).and_then(Value::as_i64).unwrap_or(0);
            obj.insert(attr.clone(), Value::from(current + by));
        }
        for (attr, value) in &self.sets {
            obj.insert(attr.clone(), value.clone());
        }
        Ok(())
    }
}

#[async_trait]
pub trait Table<T: Record>: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, key: &RecordKey) -> Result<Option<T>, StoreError>;

    /// Store a new record; [`StoreError::Conflict`] if the key is taken.
    async fn insert(&self, record: &T) -> Result<(), StoreError>;

    /// Store a record, replacing any existing one with the same key.
    async fn put(&self, record: &T) -> Result<(), StoreError>;

    /// Upsert many records; returns how many were written.
    async fn put_batch(&self, records: &[T]) -> Result<usize, StoreError>;

    /// Full scan, following pagination to the end.
    async fn scan(&self, filter: &ScanFilter) -> Result<Vec<T>, StoreError>;

    /// Returns the updated record, or `None` when the key does not exist.
    /// [`StoreError::GuardFailed`] when an `at_least` bound does not hold.
    async fn update(&self, key: &RecordKey, update: &Update) -> Result<Option<T>, StoreError>;
}
