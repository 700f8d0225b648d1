use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{Key, StorageEngine, StoreError, Table, UpdateOutput};

/// An in-process storage engine. Each increment runs inside one critical
/// section, which gives the same guarantee as a remote atomic update.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Arc<MemoryTable>>>,
    /// When set, only these tables exist; otherwise tables appear on first
    /// use.
    allowed: Option<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that only knows the given tables.
    pub fn with_tables<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: Mutex::new(HashMap::new()),
            allowed: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    fn open(&self, name: &str) -> Result<Arc<MemoryTable>, StoreError> {
        if let Some(allowed) = &self.allowed {
            if !allowed.contains(name) {
                return Err(StoreError::TableNotFound(name.into()));
            }
        }
        let mut tables = self.tables.lock();
        let table = tables
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryTable::default()));
        Ok(table.clone())
    }

    /// Set `field` of the record at `key` in `table`. Fails when `table`
    /// is not one of the store's tables.
    pub fn with_count(
        self,
        table: &str,
        key: &Key,
        field: &str,
        value: i64,
    ) -> Result<Self, StoreError> {
        self.open(table)?.set(key, field, value);
        Ok(self)
    }

    /// Read `field` of the record at `key` in `table`, if it exists.
    pub fn count(&self, table: &str, key: &Key, field: &str) -> Option<i64> {
        self.tables.lock().get(table)?.get(key, field)
    }
}

#[async_trait]
impl StorageEngine for MemoryStore {
    async fn table(&self, name: &str) -> Result<Arc<dyn Table>, StoreError> {
        let table: Arc<dyn Table> = self.open(name)?;
        Ok(table)
    }
}

#[derive(Default)]
pub struct MemoryTable {
    records: Mutex<HashMap<Key, HashMap<String, i64>>>,
}

impl MemoryTable {
    pub fn get(&self, key: &Key, field: &str) -> Option<i64> {
        self.records.lock().get(key)?.get(field).copied()
    }

    pub fn set(&self, key: &Key, field: &str, value: i64) {
        self.records
            .lock()
            .entry(key.clone())
            .or_default()
            .insert(field.into(), value);
    }
}

#[async_trait]
impl Table for MemoryTable {
    async fn atomic_increment(
        &self,
        key: &Key,
        field: &str,
        delta: i64,
    ) -> Result<UpdateOutput, StoreError> {
        // the whole read-add-write happens under this one lock
        let mut records = self.records.lock();
        let slot = records
            .entry(key.clone())
            .or_default()
            .entry(field.to_string())
            .or_insert(0);
        let updated = slot.checked_add(delta).ok_or_else(|| {
            StoreError::Rejected(format!("{field} would overflow adding {delta} to {slot}"))
        })?;
        *slot = updated;
        debug!(key = %key.value, field, updated, "Applied increment");
        Ok(UpdateOutput::new(200, field, updated))
    }
}
