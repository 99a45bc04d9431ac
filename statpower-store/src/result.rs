//! Result Store
//!
//! Persists power results keyed by a caller-chosen string. Inserts upsert by
//! key while preserving first-insertion order, so batched report streaming
//! via `get_results(offset, limit)` sees a stable total order.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use statpower_core::PowerResult;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Keyed storage for terminal power results
pub trait ResultStore: Send + Sync {
    /// Prepare the store for use (idempotent)
    fn init(&self) -> Result<(), StoreError>;

    /// Upsert a result under `key`
    fn insert_result(&self, key: &str, result: PowerResult) -> Result<(), StoreError>;

    /// Result stored under `key`, if any
    fn get_result(&self, key: &str) -> Result<Option<PowerResult>, StoreError>;

    /// A batch of results in insertion order, starting at `offset`.
    ///
    /// Returns fewer than `limit` records (possibly zero) once the store is
    /// exhausted; callers iterate with increasing offsets until then.
    fn get_results(&self, offset: usize, limit: usize) -> Result<Vec<PowerResult>, StoreError>;
}

#[derive(Default)]
struct Rows {
    order: Vec<String>,
    by_key: HashMap<String, PowerResult>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResultEntry {
    key: String,
    result: PowerResult,
}

/// In-memory result store with JSON snapshot persistence
#[derive(Default)]
pub struct MemoryResultStore {
    inner: Mutex<Rows>,
}

impl MemoryResultStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Rows>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Number of stored results
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.order.len())
    }

    /// Whether the store holds no results
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.order.is_empty())
    }

    /// Write a JSON snapshot of the store contents
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let entries: Vec<ResultEntry> = guard
            .order
            .iter()
            .filter_map(|key| {
                guard.by_key.get(key).map(|result| ResultEntry {
                    key: key.clone(),
                    result: result.clone(),
                })
            })
            .collect();
        drop(guard);

        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a store from a JSON snapshot written by [`MemoryResultStore::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path)?;
        let entries: Vec<ResultEntry> = serde_json::from_str(&json)?;

        let mut rows = Rows::default();
        for entry in entries {
            if !rows.by_key.contains_key(&entry.key) {
                rows.order.push(entry.key.clone());
            }
            rows.by_key.insert(entry.key, entry.result);
        }
        Ok(Self {
            inner: Mutex::new(rows),
        })
    }
}

impl ResultStore for MemoryResultStore {
    fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert_result(&self, key: &str, result: PowerResult) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if !guard.by_key.contains_key(key) {
            guard.order.push(key.to_string());
        }
        guard.by_key.insert(key.to_string(), result);
        Ok(())
    }

    fn get_result(&self, key: &str) -> Result<Option<PowerResult>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.by_key.get(key).cloned())
    }

    fn get_results(&self, offset: usize, limit: usize) -> Result<Vec<PowerResult>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .order
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|key| guard.by_key.get(key).cloned())
            .collect())
    }
}
