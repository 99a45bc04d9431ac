#![warn(missing_docs)]
//! Statpower Store - Keyed Experiment Persistence
//!
//! Three independent keyed tables, no foreign-key coupling beyond the shared
//! code/size/alpha vocabulary:
//! - samples: append-only random-variate sample sets per (generator code, size)
//! - critical values: upserted thresholds per (test code, size, alpha) plus
//!   the sorted null-distribution samples they were derived from
//! - results: upserted power results in stable insertion order
//!
//! The in-memory implementations synchronize internally per call, so one
//! store instance can be shared across worker threads behind an `Arc`. Each
//! supports JSON save/load so caches survive across runs.

mod critical_value;
mod error;
mod result;
mod sample;

pub use critical_value::{CriticalValueStore, MemoryCriticalValueStore};
pub use error::StoreError;
pub use result::{MemoryResultStore, ResultStore};
pub use sample::{MemorySampleStore, SampleStore};
