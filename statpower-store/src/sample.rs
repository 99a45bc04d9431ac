//! Sample Store
//!
//! Persists generated random-variate samples keyed by (generator code, size).
//! Sample sets grow monotonically: inserts append, never deduplicate; the
//! only removal is a wholesale clear.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Keyed storage for random-variate sample sets
pub trait SampleStore: Send + Sync {
    /// Prepare the store for use (idempotent)
    fn init(&self) -> Result<(), StoreError>;

    /// Append one sample to the set for (code, size)
    fn insert_rvs(&self, code: &str, size: usize, sample: Vec<f64>) -> Result<(), StoreError>;

    /// Append a batch of samples to the set for (code, size)
    fn insert_all_rvs(
        &self,
        code: &str,
        size: usize,
        samples: Vec<Vec<f64>>,
    ) -> Result<(), StoreError>;

    /// All samples stored for (code, size), in insertion order
    fn get_rvs(&self, code: &str, size: usize) -> Result<Vec<Vec<f64>>, StoreError>;

    /// Number of samples stored for (code, size)
    fn get_rvs_count(&self, code: &str, size: usize) -> Result<usize, StoreError>;

    /// Statistics view: every distinct (code, size) with its sample count
    fn get_rvs_stat(&self) -> Result<Vec<(String, usize, usize)>, StoreError>;

    /// Remove every stored sample
    fn clear_all_rvs(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SampleEntry {
    code: String,
    size: usize,
    samples: Vec<Vec<f64>>,
}

/// In-memory sample store with JSON snapshot persistence
#[derive(Default)]
pub struct MemorySampleStore {
    inner: Mutex<BTreeMap<(String, usize), Vec<Vec<f64>>>>,
}

impl MemorySampleStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<(String, usize), Vec<Vec<f64>>>>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Write a JSON snapshot of the store contents
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let entries: Vec<SampleEntry> = guard
            .iter()
            .map(|((code, size), samples)| SampleEntry {
                code: code.clone(),
                size: *size,
                samples: samples.clone(),
            })
            .collect();
        drop(guard);

        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a store from a JSON snapshot written by [`MemorySampleStore::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path)?;
        let entries: Vec<SampleEntry> = serde_json::from_str(&json)?;

        let mut map = BTreeMap::new();
        for entry in entries {
            map.insert((entry.code, entry.size), entry.samples);
        }
        Ok(Self {
            inner: Mutex::new(map),
        })
    }
}

impl SampleStore for MemorySampleStore {
    fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert_rvs(&self, code: &str, size: usize, sample: Vec<f64>) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        guard
            .entry((code.to_string(), size))
            .or_default()
            .push(sample);
        Ok(())
    }

    fn insert_all_rvs(
        &self,
        code: &str,
        size: usize,
        samples: Vec<Vec<f64>>,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        guard
            .entry((code.to_string(), size))
            .or_default()
            .extend(samples);
        Ok(())
    }

    fn get_rvs(&self, code: &str, size: usize) -> Result<Vec<Vec<f64>>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .get(&(code.to_string(), size))
            .cloned()
            .unwrap_or_default())
    }

    fn get_rvs_count(&self, code: &str, size: usize) -> Result<usize, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .get(&(code.to_string(), size))
            .map(|s| s.len())
            .unwrap_or(0))
    }

    fn get_rvs_stat(&self) -> Result<Vec<(String, usize, usize)>, StoreError> {
        let guard = self.lock()?;
        Ok(guard
            .iter()
            .map(|((code, size), samples)| (code.clone(), *size, samples.len()))
            .collect())
    }

    fn clear_all_rvs(&self) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        guard.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_all_appends_not_dedupes() {
        let store = MemorySampleStore::new();
        store.init().unwrap();

        let samples = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        store.insert_all_rvs("normal_0_1", 2, samples.clone()).unwrap();
        assert_eq!(store.get_rvs_count("normal_0_1", 2).unwrap(), 2);

        // Identical second insert doubles the count (append semantics)
        store.insert_all_rvs("normal_0_1", 2, samples).unwrap();
        assert_eq!(store.get_rvs_count("normal_0_1", 2).unwrap(), 4);
    }

    #[test]
    fn keys_are_independent() {
        let store = MemorySampleStore::new();
        store.insert_rvs("a", 10, vec![0.0; 10]).unwrap();
        store.insert_rvs("a", 20, vec![0.0; 20]).unwrap();
        store.insert_rvs("b", 10, vec![1.0; 10]).unwrap();

        assert_eq!(store.get_rvs_count("a", 10).unwrap(), 1);
        assert_eq!(store.get_rvs_count("a", 20).unwrap(), 1);
        assert_eq!(store.get_rvs_count("b", 10).unwrap(), 1);
        assert_eq!(store.get_rvs_count("b", 20).unwrap(), 0);
    }

    #[test]
    fn stat_lists_all_keys() {
        let store = MemorySampleStore::new();
        store.insert_rvs("a", 10, vec![0.0; 10]).unwrap();
        store.insert_rvs("b", 10, vec![0.0; 10]).unwrap();
        store.insert_rvs("b", 10, vec![0.0; 10]).unwrap();

        let stat = store.get_rvs_stat().unwrap();
        assert_eq!(stat.len(), 2);
        assert!(stat.contains(&("a".to_string(), 10, 1)));
        assert!(stat.contains(&("b".to_string(), 10, 2)));
    }

    #[test]
    fn clear_removes_everything() {
        let store = MemorySampleStore::new();
        store.insert_rvs("a", 5, vec![0.0; 5]).unwrap();
        store.clear_all_rvs().unwrap();

        assert_eq!(store.get_rvs_count("a", 5).unwrap(), 0);
        assert!(store.get_rvs_stat().unwrap().is_empty());
    }

    #[test]
    fn preserves_insertion_order() {
        let store = MemorySampleStore::new();
        store.insert_rvs("a", 2, vec![1.0, 1.0]).unwrap();
        store.insert_rvs("a", 2, vec![2.0, 2.0]).unwrap();

        let samples = store.get_rvs("a", 2).unwrap();
        assert_eq!(samples[0], vec![1.0, 1.0]);
        assert_eq!(samples[1], vec![2.0, 2.0]);
    }

    #[test]
    fn save_load_round_trip() {
        let store = MemorySampleStore::new();
        store.insert_rvs("normal_0_1", 3, vec![1.0, 2.0, 3.0]).unwrap();
        store.insert_rvs("exponential_1", 2, vec![0.5, 1.5]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.json");
        store.save(&path).unwrap();

        let loaded = MemorySampleStore::load(&path).unwrap();
        assert_eq!(loaded.get_rvs_count("normal_0_1", 3).unwrap(), 1);
        assert_eq!(
            loaded.get_rvs("exponential_1", 2).unwrap(),
            vec![vec![0.5, 1.5]]
        );
    }
}
