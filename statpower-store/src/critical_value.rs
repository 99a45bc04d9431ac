//! Critical-Value Store
//!
//! Persists simulated null-distribution samples keyed by (test code, size)
//! and the critical values derived from them keyed by (test code, size,
//! alpha). Both tables upsert: concurrent first-time calibration of the same
//! key is last-writer-wins, which is the accepted race documented by the
//! calculator.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use statpower_core::CriticalValue;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Keyed storage for critical values and their null distributions
pub trait CriticalValueStore: Send + Sync {
    /// Prepare the store for use (idempotent)
    fn init(&self) -> Result<(), StoreError>;

    /// Upsert the critical value for (test code, size, alpha)
    fn insert_critical_value(
        &self,
        test_code: &str,
        size: usize,
        alpha: f64,
        value: CriticalValue,
    ) -> Result<(), StoreError>;

    /// Upsert the sorted null-distribution sample for (test code, size)
    fn insert_distribution(
        &self,
        test_code: &str,
        size: usize,
        values: Vec<f64>,
    ) -> Result<(), StoreError>;

    /// Previously stored critical value, if any
    fn get_critical_value(
        &self,
        test_code: &str,
        size: usize,
        alpha: f64,
    ) -> Result<Option<CriticalValue>, StoreError>;

    /// Previously stored null-distribution sample, if any, in stored order
    fn get_distribution(&self, test_code: &str, size: usize)
    -> Result<Option<Vec<f64>>, StoreError>;
}

#[derive(Default)]
struct Tables {
    // alpha keyed by bit pattern: exact match semantics, no float fuzziness
    critical_values: HashMap<(String, usize, u64), CriticalValue>,
    distributions: HashMap<(String, usize), Vec<f64>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CriticalValueEntry {
    test_code: String,
    size: usize,
    alpha: f64,
    value: CriticalValue,
}

#[derive(Debug, Serialize, Deserialize)]
struct DistributionEntry {
    test_code: String,
    size: usize,
    values: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    critical_values: Vec<CriticalValueEntry>,
    distributions: Vec<DistributionEntry>,
}

/// In-memory critical-value store with JSON snapshot persistence
#[derive(Default)]
pub struct MemoryCriticalValueStore {
    inner: Mutex<Tables>,
}

impl MemoryCriticalValueStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Number of stored critical-value rows
    pub fn critical_value_rows(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.critical_values.len())
    }

    /// Number of stored null-distribution rows
    pub fn distribution_rows(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.distributions.len())
    }

    /// Write a JSON snapshot of the store contents
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let mut critical_values: Vec<CriticalValueEntry> = guard
            .critical_values
            .iter()
            .map(|((code, size, alpha_bits), value)| CriticalValueEntry {
                test_code: code.clone(),
                size: *size,
                alpha: f64::from_bits(*alpha_bits),
                value: *value,
            })
            .collect();
        let mut distributions: Vec<DistributionEntry> = guard
            .distributions
            .iter()
            .map(|((code, size), values)| DistributionEntry {
                test_code: code.clone(),
                size: *size,
                values: values.clone(),
            })
            .collect();
        drop(guard);

        critical_values.sort_by(|a, b| (&a.test_code, a.size).cmp(&(&b.test_code, b.size)));
        distributions.sort_by(|a, b| (&a.test_code, a.size).cmp(&(&b.test_code, b.size)));

        let snapshot = Snapshot {
            critical_values,
            distributions,
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a store from a JSON snapshot written by [`MemoryCriticalValueStore::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&json)?;

        let mut tables = Tables::default();
        for entry in snapshot.critical_values {
            tables.critical_values.insert(
                (entry.test_code, entry.size, entry.alpha.to_bits()),
                entry.value,
            );
        }
        for entry in snapshot.distributions {
            tables
                .distributions
                .insert((entry.test_code, entry.size), entry.values);
        }
        Ok(Self {
            inner: Mutex::new(tables),
        })
    }
}

impl CriticalValueStore for MemoryCriticalValueStore {
    fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert_critical_value(
        &self,
        test_code: &str,
        size: usize,
        alpha: f64,
        value: CriticalValue,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        guard
            .critical_values
            .insert((test_code.to_string(), size, alpha.to_bits()), value);
        Ok(())
    }

    fn insert_distribution(
        &self,
        test_code: &str,
        size: usize,
        values: Vec<f64>,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        guard
            .distributions
            .insert((test_code.to_string(), size), values);
        Ok(())
    }

    fn get_critical_value(
        &self,
        test_code: &str,
        size: usize,
        alpha: f64,
    ) -> Result<Option<CriticalValue>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .critical_values
            .get(&(test_code.to_string(), size, alpha.to_bits()))
            .copied())
    }

    fn get_distribution(
        &self,
        test_code: &str,
        size: usize,
    ) -> Result<Option<Vec<f64>>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .distributions
            .get(&(test_code.to_string(), size))
            .cloned())
    }
}
